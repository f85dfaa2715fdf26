//! Vehicle API handlers

use crate::api::{MessageResponse, SuccessResponse};
use crate::domain::{AccountId, CreateVehicleInput, UpdateVehicleInput, VehicleId};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::state::HasServices;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// Register a vehicle for the caller. The first one becomes selected.
pub async fn create<S: HasServices>(
    State(state): State<S>,
    AuthUser(caller): AuthUser,
    Json(input): Json<CreateVehicleInput>,
) -> Result<impl IntoResponse> {
    let vehicle = state
        .account_service()
        .create_vehicle(caller.account_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(vehicle))))
}

pub async fn update<S: HasServices>(
    State(state): State<S>,
    AuthUser(caller): AuthUser,
    Path(id): Path<VehicleId>,
    Json(input): Json<UpdateVehicleInput>,
) -> Result<impl IntoResponse> {
    let vehicle = state
        .account_service()
        .update_vehicle(&caller, id, input)
        .await?;
    Ok(Json(SuccessResponse::new(vehicle)))
}

pub async fn delete<S: HasServices>(
    State(state): State<S>,
    AuthUser(caller): AuthUser,
    Path(id): Path<VehicleId>,
) -> Result<impl IntoResponse> {
    state.account_service().delete_vehicle(&caller, id).await?;
    Ok(Json(MessageResponse::new("Vehicle deleted successfully")))
}

pub async fn select<S: HasServices>(
    State(state): State<S>,
    AuthUser(caller): AuthUser,
    Path(id): Path<VehicleId>,
) -> Result<impl IntoResponse> {
    let vehicle = state.account_service().set_selected(&caller, id).await?;
    Ok(Json(SuccessResponse::new(vehicle)))
}

/// Internal: the owner's selected vehicle
pub async fn internal_selected<S: HasServices>(
    State(state): State<S>,
    Path(owner_id): Path<AccountId>,
) -> Result<impl IntoResponse> {
    let vehicle = state.account_service().get_selected(owner_id).await?;
    Ok(Json(SuccessResponse::new(vehicle)))
}
