//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging when only the REST server (with
//! OpenAPI/Swagger UI) is wanted. The workspace's main `klinik-run` binary
//! is the normal entry point and serves the same router.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use klinik_core::config::page_size_from_env_value;
use klinik_core::{constants, CoreConfig, RecordStoreClient};

/// Main entry point for the standalone Klinik REST API server
///
/// Starts the REST API server on the configured address (default: 0.0.0.0:3000).
///
/// # Environment Variables
/// - `KLINIK_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `RECORD_STORE_URL`: Base URL of the Record Store (default: "http://localhost:1337")
/// - `KLINIK_PAGE_SIZE`: Page size for listings (default: 10)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("KLINIK_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting Klinik REST API on {}", addr);

    let store_url = std::env::var("RECORD_STORE_URL")
        .unwrap_or_else(|_| constants::DEFAULT_RECORD_STORE_URL.into());
    let page_size = page_size_from_env_value(std::env::var("KLINIK_PAGE_SIZE").ok())?;

    let cfg = Arc::new(CoreConfig::new(store_url, page_size)?);
    let client = Arc::new(RecordStoreClient::new(cfg.record_store_url())?);
    let state = AppState { cfg, client };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
