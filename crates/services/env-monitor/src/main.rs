//! Environment monitor relay binary

use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relaycast_env_monitor::{
    api::{build_router, AppState},
    config::Config,
};
use relaycast_pubsub::RealtimeChannelClient;
use relaycast_tablestore::TableServiceClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting environment monitor relay...");

    // Load configuration
    let config = Config::load(std::env::var("ENVMON_CONFIG").ok())?;
    let config = Arc::new(config);

    tracing::info!(
        "Configuration: port={}, channel={}, table={}",
        config.server.port,
        config.channel.name,
        config.storage.table
    );

    // Construct the external client handles once; they are shared across
    // requests for the life of the process
    let channel = RealtimeChannelClient::from_connection_string(
        &config.channel.connection_string,
        &config.channel.name,
        config.channel.token_ttl_seconds,
    )?;
    let store = TableServiceClient::new(&config.storage.endpoint, &config.storage.sas_token)?;

    let state = AppState::new(Arc::new(channel), Arc::new(store), config.clone());

    // Build HTTP router
    let router = build_router(state);

    // Start HTTP server
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("HTTP server listening on {}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Environment monitor relay shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
