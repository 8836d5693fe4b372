//! ossup server
//!
//! Serves the upload page and brokers multipart uploads to object storage.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ossup_api::{AppState, create_router};
use ossup_core::storage::{S3MultipartStore, StorageConfig};
use ossup_core::upload::{UploadOptions, UploadService};
use ossup_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ossup=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;
    config
        .storage
        .validate()
        .context("invalid storage configuration")?;

    // Create storage client
    let store = S3MultipartStore::from_config(StorageConfig::from(&config.storage))
        .context("failed to create storage client")?;
    info!(
        endpoint = %config.storage.endpoint_host(),
        bucket = %config.storage.bucket_name,
        region = %config.storage.region(),
        "Storage client configured"
    );

    // Create application state
    let options = UploadOptions::from(&config.storage);
    info!(
        part_url_ttl_secs = options.part_url_ttl.as_secs(),
        public_url_ttl_secs = options.public_url_ttl.as_secs(),
        "Upload URL lifetimes configured"
    );
    let uploads = UploadService::new(Arc::new(store)).with_options(options);
    let state = AppState::new(Arc::new(uploads))
        .with_upstream_errors_exposed(config.server.expose_upstream_errors);

    // Create router
    let app = create_router(state, &config.server.route_prefix);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        route_prefix = %config.server.route_prefix,
        "Server listening on {}", addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
