//! Application state trait for dependency injection
//!
//! Handlers are generic over `HasServices`, so the same router runs against
//! the production `AppState` and the in-memory state used in tests.

use crate::config::Config;
use crate::middleware::auth::IdentityResolver;
use crate::repository::{AccountRepository, VehicleRepository};
use crate::service::AccountService;
use metrics_exporter_prometheus::PrometheusHandle;

pub trait HasServices: Clone + Send + Sync + 'static {
    /// The account repository type
    type AccountRepo: AccountRepository;
    /// The vehicle repository type
    type VehicleRepo: VehicleRepository;

    fn config(&self) -> &Config;

    fn account_service(&self) -> &AccountService<Self::AccountRepo, Self::VehicleRepo>;

    /// Resolves the caller from request headers for the configured auth mode
    fn identity_resolver(&self) -> &IdentityResolver;

    /// `None` when metrics are disabled
    fn metrics_handle(&self) -> Option<&PrometheusHandle>;

    /// Whether the backing store answers
    fn check_ready(&self) -> impl std::future::Future<Output = bool> + Send;
}
