//! Unified error handling for Motorist Core

use crate::domain::{AccountId, VehicleId};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Account {0} not found")]
    AccountNotFound(AccountId),

    #[error("Vehicle {0} not found")]
    VehicleNotFound(VehicleId),

    #[error("Account {0} has no selected vehicle")]
    NoSelectedVehicle(AccountId),

    #[error("Account {0} already exists")]
    AccountAlreadyExists(AccountId),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Persistence failure, tagged with the operation that produced it.
    #[error("Storage error while {context}")]
    Storage {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn storage(context: &'static str, source: sqlx::Error) -> Self {
        AppError::Storage { context, source }
    }
}

/// Attach an operation name to a raw sqlx result.
///
/// `AppError` has no `From<sqlx::Error>`; query sites go through this instead.
pub trait StorageContext<T> {
    fn storage_context(self, context: &'static str) -> Result<T>;
}

impl<T> StorageContext<T> for std::result::Result<T, sqlx::Error> {
    fn storage_context(self, context: &'static str) -> Result<T> {
        self.map_err(|source| AppError::storage(context, source))
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::AccountNotFound(_) => {
                (StatusCode::NOT_FOUND, "not_found", "Account not found".to_string())
            }
            AppError::VehicleNotFound(_) | AppError::NoSelectedVehicle(_) => {
                (StatusCode::NOT_FOUND, "not_found", "Vehicle not found".to_string())
            }
            AppError::AccountAlreadyExists(_) => (
                StatusCode::CONFLICT,
                "conflict",
                "Account with this id already exists".to_string(),
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation", msg.clone()),
            AppError::Storage { context, source } => {
                tracing::error!(context = %context, error = ?source, "Storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

// Conversion from validation errors
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}
