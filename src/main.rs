//! Main workspace binary: serves the Klinik REST API.
//!
//! Configuration is resolved once here, at startup, from the environment
//! (after `dotenvy` loads any `.env` file); request handling never reads
//! the environment.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use klinik_core::config::page_size_from_env_value;
use klinik_core::{constants, CoreConfig, RecordStoreClient};

/// Main entry point for the Klinik application
///
/// Starts the REST server (default port 3000) backed by the configured
/// Record Store.
///
/// # Environment Variables
/// - `KLINIK_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `RECORD_STORE_URL`: Base URL of the Record Store (default: "http://localhost:1337")
/// - `KLINIK_PAGE_SIZE`: Page size for listings (default: 10)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("klinik=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("KLINIK_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let store_url = std::env::var("RECORD_STORE_URL")
        .unwrap_or_else(|_| constants::DEFAULT_RECORD_STORE_URL.into());
    let page_size = page_size_from_env_value(std::env::var("KLINIK_PAGE_SIZE").ok())?;

    let cfg = Arc::new(CoreConfig::new(store_url, page_size)?);
    let client = Arc::new(RecordStoreClient::new(cfg.record_store_url())?);
    let state = AppState { cfg, client };

    tracing::info!(
        "-- Starting Klinik REST API on {} (record store: {})",
        rest_addr,
        state.cfg.record_store_url()
    );

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
