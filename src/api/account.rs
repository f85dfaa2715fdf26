//! Account API handlers

use crate::api::{MessageResponse, SuccessResponse};
use crate::domain::{AccountId, CreateAccountInput, UpdateAccountInput};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::state::HasServices;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

/// Body of `GET /internal/accounts/superusers`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuperusersResponse {
    pub superuser_ids: Vec<AccountId>,
}

/// Sign up
pub async fn create<S: HasServices>(
    State(state): State<S>,
    Json(input): Json<CreateAccountInput>,
) -> Result<impl IntoResponse> {
    let account = state.account_service().create_account(input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(account))))
}

/// Caller's own account with its vehicles
pub async fn get_me<S: HasServices>(
    State(state): State<S>,
    AuthUser(caller): AuthUser,
) -> Result<impl IntoResponse> {
    let account = state
        .account_service()
        .get_account_with_vehicles(caller.account_id)
        .await?;
    Ok(Json(SuccessResponse::new(account)))
}

pub async fn update_me<S: HasServices>(
    State(state): State<S>,
    AuthUser(caller): AuthUser,
    Json(input): Json<UpdateAccountInput>,
) -> Result<impl IntoResponse> {
    let account = state
        .account_service()
        .update_account(caller.account_id, input)
        .await?;
    Ok(Json(SuccessResponse::new(account)))
}

pub async fn delete_me<S: HasServices>(
    State(state): State<S>,
    AuthUser(caller): AuthUser,
) -> Result<impl IntoResponse> {
    state
        .account_service()
        .delete_account(caller.account_id)
        .await?;
    Ok(Json(MessageResponse::new("Account deleted successfully")))
}

/// Another account, subject to the caller's role
pub async fn get<S: HasServices>(
    State(state): State<S>,
    AuthUser(caller): AuthUser,
    Path(id): Path<AccountId>,
) -> Result<impl IntoResponse> {
    let account = state.account_service().get_account_for(&caller, id).await?;
    Ok(Json(SuccessResponse::new(account)))
}

// ==================== Internal (service-to-service) ====================

pub async fn internal_get<S: HasServices>(
    State(state): State<S>,
    Path(id): Path<AccountId>,
) -> Result<impl IntoResponse> {
    let account = state.account_service().get_account(id).await?;
    Ok(Json(SuccessResponse::new(account)))
}

pub async fn internal_superusers<S: HasServices>(
    State(state): State<S>,
) -> Result<impl IntoResponse> {
    let superuser_ids = state.account_service().list_superusers().await?;
    Ok(Json(SuccessResponse::new(SuperusersResponse { superuser_ids })))
}
