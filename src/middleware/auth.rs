//! Caller identity resolution and the `AuthUser` extractor
//!
//! Two mutually exclusive strategies, picked per deployment:
//! - token: `Authorization: Bearer <jwt>` with a numeric subject
//! - trusted header: `X-User-ID` (mandatory) and `X-User-Role` (optional)

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    response::{IntoResponse, Response},
};

use crate::config::{AuthMode, Config};
use crate::domain::{AccountId, Caller, Role, UnknownRole};
use crate::error::AppError;
use crate::jwt::JwtManager;
use crate::state::HasServices;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Authentication errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No credential present
    MissingCredential,
    /// Credential header present but unusable
    InvalidHeader(String),
    /// Token validation failed
    InvalidToken,
    /// Subject or identity header is not a positive integer
    InvalidSubject,
    /// Role present but outside the closed set
    InvalidRole(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential => {
                AppError::Unauthorized("Missing authentication credential".to_string())
            }
            AuthError::InvalidHeader(msg) => AppError::Unauthorized(msg),
            AuthError::InvalidToken => {
                AppError::Unauthorized("Invalid or expired token".to_string())
            }
            AuthError::InvalidSubject => {
                AppError::Unauthorized("Invalid user id in credential".to_string())
            }
            AuthError::InvalidRole(role) => AppError::Validation(format!("Invalid role: {}", role)),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

/// Extract the Bearer token from the Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader("Invalid header encoding".to_string()))?;

    match auth_header.split_once(' ') {
        Some(("Bearer", token)) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::InvalidHeader(
            "Authorization header must use Bearer scheme".to_string(),
        )),
    }
}

fn parse_role(value: &str) -> Result<Role, AuthError> {
    value
        .parse::<Role>()
        .map_err(|_| AuthError::InvalidRole(value.to_string()))
}

#[derive(Clone)]
enum Strategy {
    Token(JwtManager),
    TrustedHeader,
}

/// Turns request headers into a [`Caller`].
#[derive(Clone)]
pub struct IdentityResolver {
    strategy: Strategy,
}

impl IdentityResolver {
    pub fn token(jwt_manager: JwtManager) -> Self {
        Self {
            strategy: Strategy::Token(jwt_manager),
        }
    }

    pub fn trusted_header() -> Self {
        Self {
            strategy: Strategy::TrustedHeader,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(match config.auth_mode {
            AuthMode::Token => Self::token(JwtManager::new(config.jwt.clone())?),
            AuthMode::TrustedHeader => Self::trusted_header(),
        })
    }

    pub fn mode(&self) -> AuthMode {
        match self.strategy {
            Strategy::Token(_) => AuthMode::Token,
            Strategy::TrustedHeader => AuthMode::TrustedHeader,
        }
    }

    pub fn resolve(&self, headers: &HeaderMap) -> Result<Caller, AuthError> {
        let result = match &self.strategy {
            Strategy::Token(jwt_manager) => resolve_token(jwt_manager, headers),
            Strategy::TrustedHeader => resolve_trusted_header(headers),
        };

        if let Err(err) = &result {
            tracing::debug!(error = ?err, mode = ?self.mode(), "Caller identity rejected");
        }
        result
    }
}

fn resolve_token(jwt_manager: &JwtManager, headers: &HeaderMap) -> Result<Caller, AuthError> {
    let token = extract_bearer_token(headers)?;
    let claims = jwt_manager
        .verify_access_token(token)
        .map_err(|_| AuthError::InvalidToken)?;

    let account_id = claims.account_id().ok_or(AuthError::InvalidSubject)?;
    let role = claims
        .role()
        .transpose()
        .map_err(|UnknownRole(value)| AuthError::InvalidRole(value))?;

    Ok(Caller { account_id, role })
}

fn resolve_trusted_header(headers: &HeaderMap) -> Result<Caller, AuthError> {
    let raw_id = headers
        .get(USER_ID_HEADER)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::InvalidSubject)?;

    let account_id: AccountId = raw_id.parse().map_err(|_| AuthError::InvalidSubject)?;
    if !account_id.is_valid() {
        return Err(AuthError::InvalidSubject);
    }

    let role = match headers.get(USER_ROLE_HEADER) {
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| AuthError::InvalidRole("<non-ascii>".to_string()))?;
            Some(parse_role(value.trim())?)
        }
        None => None,
    };

    Ok(Caller { account_id, role })
}

/// Axum extractor for the resolved caller.
///
/// ```ignore
/// async fn handler(AuthUser(caller): AuthUser) -> impl IntoResponse {
///     format!("hello {}", caller.account_id)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Caller);

impl<S> FromRequestParts<S> for AuthUser
where
    S: HasServices + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        state
            .identity_resolver()
            .resolve(&parts.headers)
            .map(AuthUser)
    }
}
