//! HTTP API handler tests infrastructure
//!
//! - `TestAppState` implements `HasServices` over the in-memory repositories
//! - The production `build_router()` is used, so real handlers and
//!   middleware run
//! - Request helpers return the status and the decoded JSON body

pub mod vehicle_http_test;

use super::{create_test_config, TestAccountRepository, TestVehicleRepository};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use motorist_core::config::{AuthMode, Config};
use motorist_core::middleware::IdentityResolver;
use motorist_core::server::build_router;
use motorist_core::service::AccountService;
use motorist_core::state::HasServices;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

// ============================================================================
// Test AppState
// ============================================================================

#[derive(Clone)]
pub struct TestAppState {
    pub config: Arc<Config>,
    pub account_service: Arc<AccountService<TestAccountRepository, TestVehicleRepository>>,
    pub identity_resolver: IdentityResolver,
    // Raw repositories for test setup and assertions
    pub account_repo: Arc<TestAccountRepository>,
    pub vehicle_repo: Arc<TestVehicleRepository>,
    pub ready: bool,
}

impl TestAppState {
    pub fn new(auth_mode: AuthMode) -> Self {
        let config = create_test_config(auth_mode);
        let identity_resolver = IdentityResolver::from_config(&config).unwrap();

        let vehicle_repo = Arc::new(TestVehicleRepository::new());
        let account_repo = Arc::new(TestAccountRepository::with_cascade(vehicle_repo.clone()));
        let account_service = Arc::new(AccountService::new(
            account_repo.clone(),
            vehicle_repo.clone(),
        ));

        Self {
            config: Arc::new(config),
            account_service,
            identity_resolver,
            account_repo,
            vehicle_repo,
            ready: true,
        }
    }

    pub fn with_token_auth() -> Self {
        Self::new(AuthMode::Token)
    }

    pub fn with_trusted_headers() -> Self {
        Self::new(AuthMode::TrustedHeader)
    }
}

impl HasServices for TestAppState {
    type AccountRepo = TestAccountRepository;
    type VehicleRepo = TestVehicleRepository;

    fn config(&self) -> &Config {
        &self.config
    }

    fn account_service(&self) -> &AccountService<Self::AccountRepo, Self::VehicleRepo> {
        &self.account_service
    }

    fn identity_resolver(&self) -> &IdentityResolver {
        &self.identity_resolver
    }

    fn metrics_handle(&self) -> Option<&PrometheusHandle> {
        None
    }

    async fn check_ready(&self) -> bool {
        self.ready
    }
}

pub fn build_test_router(state: TestAppState) -> Router {
    build_router(state)
}

// ============================================================================
// HTTP Test Helpers
// ============================================================================

/// Send a request and decode the body as JSON when there is one.
pub async fn send(
    app: &Router,
    method: Method,
    path: &str,
    headers: &[(&str, String)],
    body: Option<Value>,
) -> (StatusCode, Option<Value>) {
    let mut builder = Request::builder().method(method).uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, value.as_str());
    }

    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_string(&json).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();

    if body_bytes.is_empty() {
        return (status, None);
    }

    match serde_json::from_slice(&body_bytes) {
        Ok(data) => (status, Some(data)),
        Err(_) => (status, None),
    }
}

/// Send a raw, possibly malformed, JSON body.
pub async fn send_raw(
    app: &Router,
    method: Method,
    path: &str,
    headers: &[(&str, String)],
    body: &'static str,
) -> (StatusCode, Option<Value>) {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header("Content-Type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, value.as_str());
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();

    (status, serde_json::from_slice(&body_bytes).ok())
}

pub fn bearer(token: &str) -> Vec<(&'static str, String)> {
    vec![("authorization", format!("Bearer {}", token))]
}

pub async fn get_json(
    app: &Router,
    path: &str,
    headers: &[(&str, String)],
) -> (StatusCode, Option<Value>) {
    send(app, Method::GET, path, headers, None).await
}

pub async fn post_json(
    app: &Router,
    path: &str,
    headers: &[(&str, String)],
    body: Value,
) -> (StatusCode, Option<Value>) {
    send(app, Method::POST, path, headers, Some(body)).await
}

pub async fn put_json(
    app: &Router,
    path: &str,
    headers: &[(&str, String)],
    body: Option<Value>,
) -> (StatusCode, Option<Value>) {
    send(app, Method::PUT, path, headers, body).await
}

pub async fn patch_json(
    app: &Router,
    path: &str,
    headers: &[(&str, String)],
    body: Value,
) -> (StatusCode, Option<Value>) {
    send(app, Method::PATCH, path, headers, Some(body)).await
}

pub async fn delete_json(
    app: &Router,
    path: &str,
    headers: &[(&str, String)],
) -> (StatusCode, Option<Value>) {
    send(app, Method::DELETE, path, headers, None).await
}
