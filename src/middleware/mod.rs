//! HTTP middleware for Motorist Core
//!
//! - Caller identity resolution and the `AuthUser` extractor
//! - Request id propagation and HTTP metrics
//! - JSON normalization of framework error responses
//! - Log-safe request spans

pub mod auth;
pub mod error_response;
pub mod metrics;
pub mod trace;

pub use auth::{AuthUser, IdentityResolver};
pub use error_response::normalize_error_response;
pub use metrics::{capture_matched_path, ObservabilityLayer};
pub use trace::RequestSpan;
