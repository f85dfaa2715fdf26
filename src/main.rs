use anyhow::Result;
use motorist_core::{config::Config, server, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let prometheus_handle = telemetry::init(&config.telemetry)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Motorist Core Service"
    );

    server::run(config, prometheus_handle).await
}
