//! viewer-relay entry point.
//!
//! Binds the native bridge and the WebSocket server, then runs until Ctrl-C.

use tracing_subscriber::EnvFilter;

use viewer_relay::app::Relay;
use viewer_relay::config::{LogFormat, RelayConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = RelayConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!(
        bridge = %config.bridge_addr,
        pubsub = %config.pubsub_addr,
        "starting viewer-relay"
    );

    // Bind both listeners; a bind failure aborts startup
    let relay = Relay::bind(&config).await.inspect_err(|err| {
        tracing::error!(error = %err, "startup failed");
    })?;

    relay.run(shutdown_signal()).await?;

    tracing::info!("viewer-relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
