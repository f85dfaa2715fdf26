//! Configuration management for Motorist Core

use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Per-request timeout
    pub http_timeout_secs: u64,
    /// Database configuration
    pub database: DatabaseConfig,
    /// How callers are identified
    pub auth_mode: AuthMode,
    /// JWT configuration (token mode)
    pub jwt: JwtConfig,
    /// Logging and metrics
    pub telemetry: TelemetryConfig,
    /// Apply embedded migrations at startup
    pub run_migrations: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Checked against `iss` when set
    pub issuer: Option<String>,
    pub access_token_ttl_secs: i64,
    pub private_key_pem: Option<String>,
    pub public_key_pem: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "text" or "json"
    pub log_format: String,
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            metrics_enabled: true,
        }
    }
}

/// Deployment-selected identity source. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// `Authorization: Bearer <jwt>`
    #[default]
    Token,
    /// `X-User-ID` / `X-User-Role` set by a trusted gateway
    TrustedHeader,
}

impl FromStr for AuthMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "token" | "jwt" => Ok(AuthMode::Token),
            "header" | "trusted_header" => Ok(AuthMode::TrustedHeader),
            other => bail!("unknown AUTH_MODE '{}', expected 'token' or 'header'", other),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let auth_mode: AuthMode = get("AUTH_MODE", "token").parse()?;

        let secret = lookup("JWT_SECRET").unwrap_or_default();
        let private_key_pem = lookup("JWT_PRIVATE_KEY").map(|value| value.replace("\\n", "\n"));
        let public_key_pem = lookup("JWT_PUBLIC_KEY").map(|value| value.replace("\\n", "\n"));
        if private_key_pem.is_some() != public_key_pem.is_some() {
            bail!("JWT_PRIVATE_KEY and JWT_PUBLIC_KEY must be set together");
        }
        if auth_mode == AuthMode::Token
            && secret.is_empty()
            && private_key_pem.is_none()
            && public_key_pem.is_none()
        {
            bail!("JWT_SECRET is required when AUTH_MODE=token");
        }

        Ok(Self {
            http_host: get("HTTP_HOST", "0.0.0.0"),
            http_port: get("HTTP_PORT", "8080")
                .parse()
                .context("Invalid HTTP_PORT")?,
            http_timeout_secs: get("HTTP_TIMEOUT_SECS", "15")
                .parse()
                .context("Invalid HTTP_TIMEOUT_SECS")?,
            database: DatabaseConfig {
                url: database_url(&lookup)?,
                max_connections: get("DATABASE_MAX_CONNECTIONS", "10")
                    .parse()
                    .context("Invalid DATABASE_MAX_CONNECTIONS")?,
                min_connections: get("DATABASE_MIN_CONNECTIONS", "2")
                    .parse()
                    .context("Invalid DATABASE_MIN_CONNECTIONS")?,
            },
            auth_mode,
            jwt: JwtConfig {
                secret,
                issuer: lookup("JWT_ISSUER").filter(|value| !value.is_empty()),
                access_token_ttl_secs: get("JWT_ACCESS_TOKEN_TTL_SECS", "86400")
                    .parse()
                    .context("Invalid JWT_ACCESS_TOKEN_TTL_SECS")?,
                private_key_pem,
                public_key_pem,
            },
            telemetry: TelemetryConfig {
                log_format: get("LOG_FORMAT", "text"),
                metrics_enabled: parse_bool(&get("METRICS_ENABLED", "true")),
            },
            run_migrations: parse_bool(&get("RUN_MIGRATIONS", "true")),
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

/// `DATABASE_URL` wins; otherwise assemble from the discrete settings.
fn database_url<F>(lookup: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("DATABASE_URL") {
        return Ok(url);
    }

    let host = lookup("DATABASE_HOST").context("DATABASE_URL or DATABASE_HOST is required")?;
    let port: u16 = lookup("DATABASE_PORT")
        .unwrap_or_else(|| "3306".to_string())
        .parse()
        .context("Invalid DATABASE_PORT")?;
    let user = lookup("DATABASE_USER").context("DATABASE_USER is required")?;
    let password = lookup("DATABASE_PASSWORD").unwrap_or_default();
    let name = lookup("DATABASE_NAME").context("DATABASE_NAME is required")?;

    if password.is_empty() {
        Ok(format!("mysql://{}@{}:{}/{}", user, host, port, name))
    } else {
        Ok(format!("mysql://{}:{}@{}:{}/{}", user, password, host, port, name))
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
