//! JWT token handling

use crate::config::JwtConfig;
use crate::domain::{AccountId, Role, UnknownRole};
use crate::error::{AppError, Result};
use anyhow::Context;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Access token claims.
///
/// `sub` stays raw JSON: it may arrive as a number or a numeric string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default)]
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    /// Numeric, strictly positive subject.
    pub fn account_id(&self) -> Option<AccountId> {
        let id = match self.sub.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64()?,
            serde_json::Value::String(s) => s.trim().parse::<i64>().ok()?,
            _ => return None,
        };
        let id = AccountId(id);
        id.is_valid().then_some(id)
    }

    /// `None` when the token carries no role claim.
    pub fn role(&self) -> Option<std::result::Result<Role, UnknownRole>> {
        self.role.as_deref().map(str::parse)
    }
}

/// JWT manager for minting and verifying access tokens
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl JwtManager {
    /// RS256 when both PEM keys are configured, HS256 over the shared secret
    /// when neither is. One key without the other is rejected.
    pub fn new(config: JwtConfig) -> anyhow::Result<Self> {
        let (algorithm, encoding_key, decoding_key) =
            match (config.private_key_pem.as_ref(), config.public_key_pem.as_ref()) {
                (Some(private_key), Some(public_key)) => (
                    Algorithm::RS256,
                    EncodingKey::from_rsa_pem(private_key.as_bytes())
                        .context("Failed to load JWT private key")?,
                    DecodingKey::from_rsa_pem(public_key.as_bytes())
                        .context("Failed to load JWT public key")?,
                ),
                (None, None) => (
                    Algorithm::HS256,
                    EncodingKey::from_secret(config.secret.as_bytes()),
                    DecodingKey::from_secret(config.secret.as_bytes()),
                ),
                (Some(_), None) => {
                    anyhow::bail!("JWT_PRIVATE_KEY is set but JWT_PUBLIC_KEY is missing")
                }
                (None, Some(_)) => {
                    anyhow::bail!("JWT_PUBLIC_KEY is set but JWT_PRIVATE_KEY is missing")
                }
            };

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
            algorithm,
        })
    }

    /// Validation with a 5 second leeway instead of the default 60.
    fn strict_validation(&self) -> Validation {
        let mut v = Validation::new(self.algorithm);
        v.leeway = 5;
        v.validate_aud = false;
        if let Some(issuer) = self.config.issuer.as_deref() {
            v.set_issuer(&[issuer]);
        }
        v
    }

    pub fn create_access_token(&self, account_id: AccountId, role: Option<Role>) -> Result<String> {
        self.create_access_token_with_ttl(account_id, role, self.config.access_token_ttl_secs)
    }

    pub fn create_access_token_with_ttl(
        &self,
        account_id: AccountId,
        role: Option<Role>,
        ttl_secs: i64,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(ttl_secs);

        let claims = AccessClaims {
            sub: Some(serde_json::Value::String(account_id.to_string())),
            role: role.map(|r| r.as_str().to_string()),
            iss: self.config.issuer.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to sign token: {}", e)))
    }

    /// Verify signature, expiry and (when configured) issuer.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims> {
        let token_data = decode::<AccessClaims>(token, &self.decoding_key, &self.strict_validation())
            .map_err(|e| {
                tracing::debug!(error = %e, "Access token rejected");
                AppError::Unauthorized("Invalid or expired token".to_string())
            })?;
        Ok(token_data.claims)
    }
}
