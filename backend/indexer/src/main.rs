//! Confidential ledger event indexer — entry point.
//!
//! Runs two halves off one SQLite pool: a background task that polls
//! Soroban `getEvents` for confidential ledger contract events, and an Axum
//! REST API serving the indexed stream. All amount fields in that stream
//! are ciphertext handles; the indexer never sees a plaintext contribution.

mod api;
mod config;
mod db;
mod errors;
mod events;
mod indexer;
mod rpc;

use std::sync::Arc;

use reqwest::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use indexer::IndexerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging (RUST_LOG controls verbosity) and optional .env.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;
    let pool = db::init_pool(&config.database_url).await?;

    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let api_port = config.api_port;
    tokio::spawn(indexer::run(Arc::new(IndexerState {
        pool: pool.clone(),
        config,
        client,
    })));

    let app = api::router(Arc::new(api::ApiState { pool }));
    let addr = format!("0.0.0.0:{api_port}");
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
