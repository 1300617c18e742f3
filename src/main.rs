use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use teacup_api::api;
use teacup_api::config::Config;
use teacup_api::db::init_database;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,teacup_api=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::init()?;
    info!(
        "Initialized configuration, serving on {}:{}",
        config.api.host, config.api.port
    );

    // Initialize database
    let db = Arc::new(init_database().await?);
    info!("Connected to database");

    // Prepare termination signal for graceful shutdown
    let (term_sender, term_receiver) = oneshot::channel();

    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, initiating graceful shutdown");
                let _ = term_sender.send(());
            }
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
    });

    // Run the API server until shutdown
    api::start_api_server(db, term_receiver).await?;

    info!("Teacup API shutdown complete");
    Ok(())
}
