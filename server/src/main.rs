//! Vibe Server binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vibe_server::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vibe_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!(
        "Starting Vibe Server on {}:{} ({})",
        config.host,
        config.port,
        config.environment
    );

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}, API at {}", addr, config.api_prefix);

    vibe_server::serve(listener, config).await?;

    Ok(())
}
