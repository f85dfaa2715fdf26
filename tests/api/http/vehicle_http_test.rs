//! Vehicle API HTTP tests (token mode)

use super::{
    bearer, build_test_router, delete_json, get_json, patch_json, post_json, put_json,
    TestAppState,
};
use crate::api::{test_account, token_for};
use axum::http::StatusCode;
use motorist_core::domain::{AccountId, Role, VehicleId};
use motorist_core::repository::VehicleRepository;
use serde_json::{json, Value};

fn vehicle_body(plate: &str) -> Value {
    json!({
        "brand": "Kia",
        "model": "Rio",
        "license_plate": plate,
        "color": "black"
    })
}

async fn state_with_owner(id: i64) -> TestAppState {
    let state = TestAppState::with_token_auth();
    state.account_repo.add_account(test_account(id, Role::Client)).await;
    state
}

/// Register a vehicle through the API and return its id
async fn create_vehicle(app: &axum::Router, token: &str, plate: &str) -> i64 {
    let (status, body) =
        post_json(app, "/accounts/me/vehicles", &bearer(token), vehicle_body(plate)).await;
    assert_eq!(status, StatusCode::CREATED);
    body.unwrap()["data"]["id"].as_i64().unwrap()
}

fn selected_flags(me: &Value) -> Vec<(i64, bool)> {
    me["data"]["vehicles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| (v["id"].as_i64().unwrap(), v["is_selected"].as_bool().unwrap()))
        .collect()
}

#[tokio::test]
async fn test_first_vehicle_selected_second_not() {
    let app = build_test_router(state_with_owner(100).await);
    let token = token_for(100, Some(Role::Client));

    let (status, body) = post_json(
        &app,
        "/accounts/me/vehicles",
        &bearer(&token),
        vehicle_body("A001AA77"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let first = body.unwrap();
    assert_eq!(first["data"]["is_selected"], true);
    assert_eq!(first["data"]["owner_id"], 100);
    assert_eq!(first["data"]["color"], "black");

    let (_, body) = post_json(
        &app,
        "/accounts/me/vehicles",
        &bearer(&token),
        vehicle_body("B002BB77"),
    )
    .await;
    assert_eq!(body.unwrap()["data"]["is_selected"], false);
}

#[tokio::test]
async fn test_create_vehicle_for_unregistered_owner() {
    let app = build_test_router(TestAppState::with_token_auth());
    let token = token_for(404, Some(Role::Client));

    let (status, body) = post_json(
        &app,
        "/accounts/me/vehicles",
        &bearer(&token),
        vehicle_body("A001AA77"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.unwrap()["message"], "Account not found");
}

#[tokio::test]
async fn test_create_vehicle_missing_plate() {
    let app = build_test_router(state_with_owner(100).await);
    let token = token_for(100, Some(Role::Client));

    let (status, _) = post_json(
        &app,
        "/accounts/me/vehicles",
        &bearer(&token),
        json!({"brand": "Kia", "model": "Rio", "license_plate": ""}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_vehicle_by_owner() {
    let app = build_test_router(state_with_owner(100).await);
    let token = token_for(100, Some(Role::Client));
    let id = create_vehicle(&app, &token, "A001AA77").await;

    let (status, body) = patch_json(
        &app,
        &format!("/accounts/me/vehicles/{}", id),
        &bearer(&token),
        json!({"color": "red", "size": "compact"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body.unwrap()["data"];
    assert_eq!(data["color"], "red");
    assert_eq!(data["size"], "compact");
    assert_eq!(data["brand"], "Kia");
    assert_eq!(data["is_selected"], true);
}

#[tokio::test]
async fn test_update_vehicle_by_stranger_forbidden_and_unchanged() {
    let state = state_with_owner(5).await;
    state.account_repo.add_account(test_account(6, Role::Client)).await;
    let vehicle_repo = state.vehicle_repo.clone();
    let app = build_test_router(state);

    let owner_token = token_for(5, Some(Role::Client));
    let id = create_vehicle(&app, &owner_token, "A001AA77").await;

    let stranger = token_for(6, Some(Role::Client));
    let (status, body) = patch_json(
        &app,
        &format!("/accounts/me/vehicles/{}", id),
        &bearer(&stranger),
        json!({"color": "pink"}),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.unwrap()["error"], "forbidden");
    let stored = vehicle_repo.get_by_id(VehicleId(id)).await.unwrap();
    assert_eq!(stored.color.as_deref(), Some("black"));
}

#[tokio::test]
async fn test_update_vehicle_by_superuser() {
    let app = build_test_router(state_with_owner(5).await);
    let owner_token = token_for(5, Some(Role::Client));
    let id = create_vehicle(&app, &owner_token, "A001AA77").await;

    let admin = token_for(1, Some(Role::Superuser));
    let (status, body) = patch_json(
        &app,
        &format!("/accounts/me/vehicles/{}", id),
        &bearer(&admin),
        json!({"license_plate": "Z999ZZ99"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["data"]["license_plate"], "Z999ZZ99");
}

#[tokio::test]
async fn test_update_vehicle_without_role_unauthorized() {
    let app = build_test_router(state_with_owner(5).await);
    let owner_token = token_for(5, Some(Role::Client));
    let id = create_vehicle(&app, &owner_token, "A001AA77").await;

    let no_role = token_for(5, None);
    let (status, _) = patch_json(
        &app,
        &format!("/accounts/me/vehicles/{}", id),
        &bearer(&no_role),
        json!({"color": "red"}),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_missing_vehicle() {
    let app = build_test_router(state_with_owner(5).await);
    let token = token_for(5, Some(Role::Client));

    let (status, body) = patch_json(
        &app,
        "/accounts/me/vehicles/9999",
        &bearer(&token),
        json!({"color": "red"}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.unwrap()["message"], "Vehicle not found");
}

#[tokio::test]
async fn test_non_numeric_vehicle_id_rejected_as_json() {
    let app = build_test_router(state_with_owner(5).await);
    let token = token_for(5, Some(Role::Client));

    let (status, body) = delete_json(&app, "/accounts/me/vehicles/abc", &bearer(&token)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.unwrap()["error"], "bad_request");
}

#[tokio::test]
async fn test_select_switches_selection() {
    let app = build_test_router(state_with_owner(100).await);
    let token = token_for(100, Some(Role::Client));
    let a = create_vehicle(&app, &token, "A001AA77").await;
    let b = create_vehicle(&app, &token, "B002BB77").await;

    let (status, body) = put_json(
        &app,
        &format!("/accounts/me/vehicles/{}/select", b),
        &bearer(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["data"]["is_selected"], true);

    let (_, me) = get_json(&app, "/accounts/me", &bearer(&token)).await;
    assert_eq!(selected_flags(&me.unwrap()), vec![(a, false), (b, true)]);
}

#[tokio::test]
async fn test_select_already_selected_is_noop() {
    let app = build_test_router(state_with_owner(100).await);
    let token = token_for(100, Some(Role::Client));
    let a = create_vehicle(&app, &token, "A001AA77").await;

    let (status, body) = put_json(
        &app,
        &format!("/accounts/me/vehicles/{}/select", a),
        &bearer(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["data"]["id"], a);
}

#[tokio::test]
async fn test_select_foreign_vehicle_forbidden() {
    let state = state_with_owner(5).await;
    state.account_repo.add_account(test_account(6, Role::Manager)).await;
    let app = build_test_router(state);

    let owner_token = token_for(5, Some(Role::Client));
    create_vehicle(&app, &owner_token, "A001AA77").await;
    let b = create_vehicle(&app, &owner_token, "B002BB77").await;

    let manager = token_for(6, Some(Role::Manager));
    let (status, _) = put_json(
        &app,
        &format!("/accounts/me/vehicles/{}/select", b),
        &bearer(&manager),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_selected_promotes_sibling() {
    let state = state_with_owner(100).await;
    let vehicle_repo = state.vehicle_repo.clone();
    let app = build_test_router(state);
    let token = token_for(100, Some(Role::Client));

    let a = create_vehicle(&app, &token, "A001AA77").await;
    let b = create_vehicle(&app, &token, "B002BB77").await;

    let (status, body) = delete_json(
        &app,
        &format!("/accounts/me/vehicles/{}", a),
        &bearer(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.unwrap()["message"].is_string());

    assert_eq!(
        vehicle_repo.selected_ids(AccountId(100)).await,
        vec![VehicleId(b)]
    );
}

#[tokio::test]
async fn test_delete_vehicle_by_stranger_forbidden() {
    let state = state_with_owner(5).await;
    let vehicle_repo = state.vehicle_repo.clone();
    let app = build_test_router(state);

    let owner_token = token_for(5, Some(Role::Client));
    let id = create_vehicle(&app, &owner_token, "A001AA77").await;

    let stranger = token_for(6, Some(Role::Client));
    let (status, _) = delete_json(
        &app,
        &format!("/accounts/me/vehicles/{}", id),
        &bearer(&stranger),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(vehicle_repo.count_by_owner(AccountId(5)).await, 1);
}
