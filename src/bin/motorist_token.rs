//! Mint an access token for local development.
//!
//! ```text
//! motorist-token --account-id 100 --role superuser
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use motorist_core::config::JwtConfig;
use motorist_core::domain::{AccountId, Role};
use motorist_core::jwt::JwtManager;

#[derive(Parser, Debug)]
#[command(name = "motorist-token", version, about = "Mint a signed access token")]
struct Args {
    /// Subject account id
    #[arg(long)]
    account_id: i64,

    /// Role claim (client, manager, superuser); omitted when not given
    #[arg(long)]
    role: Option<Role>,

    /// Lifetime in seconds
    #[arg(long, default_value_t = 86400)]
    ttl_secs: i64,

    /// HMAC secret
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    secret: String,

    /// Issuer claim
    #[arg(long, env = "JWT_ISSUER")]
    issuer: Option<String>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let account_id = AccountId(args.account_id);
    if !account_id.is_valid() {
        anyhow::bail!("--account-id must be a positive integer");
    }

    let manager = JwtManager::new(JwtConfig {
        secret: args.secret,
        issuer: args.issuer,
        access_token_ttl_secs: args.ttl_secs,
        private_key_pem: None,
        public_key_pem: None,
    })?;

    let token = manager
        .create_access_token_with_ttl(account_id, args.role, args.ttl_secs)
        .context("Failed to sign token")?;

    println!("{}", token);
    Ok(())
}
