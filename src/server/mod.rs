//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::middleware::{
    capture_matched_path, normalize_error_response, IdentityResolver, ObservabilityLayer,
    RequestSpan,
};
use crate::migration;
use crate::repository::{AccountRepositoryImpl, VehicleRepositoryImpl};
use crate::service::AccountService;
use crate::state::HasServices;
use anyhow::{Context, Result};
use axum::{
    routing::{get, patch, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: MySqlPool,
    pub account_service: Arc<AccountService<AccountRepositoryImpl, VehicleRepositoryImpl>>,
    pub identity_resolver: IdentityResolver,
    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        config: Config,
        db_pool: MySqlPool,
        prometheus_handle: Option<PrometheusHandle>,
    ) -> Result<Self> {
        let identity_resolver = IdentityResolver::from_config(&config)?;

        let account_repo = Arc::new(AccountRepositoryImpl::new(db_pool.clone()));
        let vehicle_repo = Arc::new(VehicleRepositoryImpl::new(db_pool.clone()));
        let account_service = Arc::new(AccountService::new(account_repo, vehicle_repo));

        Ok(Self {
            config: Arc::new(config),
            db_pool,
            account_service,
            identity_resolver,
            prometheus_handle,
        })
    }
}

impl HasServices for AppState {
    type AccountRepo = AccountRepositoryImpl;
    type VehicleRepo = VehicleRepositoryImpl;

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
        self.prometheus_handle.as_ref()
    }

    async fn check_ready(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.db_pool).await.is_ok()
    }
}

/// Build the HTTP router.
///
/// Generic over the state so integration tests can drive the same routes
/// against in-memory repositories.
pub fn build_router<S: HasServices>(state: S) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let timeout = Duration::from_secs(state.config().http_timeout_secs);

    Router::new()
        // Operational
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready::<S>))
        .route("/metrics", get(api::metrics::metrics_handler::<S>))
        // Accounts
        .route("/accounts", post(api::account::create::<S>))
        .route(
            "/accounts/me",
            get(api::account::get_me::<S>)
                .put(api::account::update_me::<S>)
                .delete(api::account::delete_me::<S>),
        )
        .route("/accounts/{id}", get(api::account::get::<S>))
        // Vehicles
        .route("/accounts/me/vehicles", post(api::vehicle::create::<S>))
        .route(
            "/accounts/me/vehicles/{id}",
            patch(api::vehicle::update::<S>).delete(api::vehicle::delete::<S>),
        )
        .route(
            "/accounts/me/vehicles/{id}/select",
            put(api::vehicle::select::<S>),
        )
        // Internal (service-to-service, not exposed publicly)
        .route(
            "/internal/accounts/superusers",
            get(api::account::internal_superusers::<S>),
        )
        .route(
            "/internal/accounts/{id}",
            get(api::account::internal_get::<S>),
        )
        .route(
            "/internal/accounts/{id}/vehicles/selected",
            get(api::vehicle::internal_selected::<S>),
        )
        .route_layer(axum::middleware::from_fn(capture_matched_path))
        .layer(TimeoutLayer::new(timeout))
        .layer(axum::middleware::from_fn(normalize_error_response))
        .layer(ObservabilityLayer)
        .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP server until SIGINT/SIGTERM.
pub async fn run(config: Config, prometheus_handle: Option<PrometheusHandle>) -> Result<()> {
    if config.run_migrations {
        migration::run_migrations(&config).await?;
    }

    let db_pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    info!("Connected to database");

    let http_addr = config.http_addr();
    let auth_mode = config.auth_mode;
    let state = AppState::new(config, db_pool.clone(), prometheus_handle)?;
    let app = build_router(state);

    let listener = TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("Failed to bind {}", http_addr))?;
    info!(addr = %http_addr, auth_mode = ?auth_mode, "HTTP server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
