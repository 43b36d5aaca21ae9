use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod payload;
mod render;
mod results;
mod routes;

use config::{Args, ServerConfig};
use results::ResultStore;

#[derive(Clone)]
pub struct AppState {
    pub results: Arc<ResultStore>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = ServerConfig::from_env(Args::parse())?;
    let state = AppState {
        results: Arc::new(ResultStore::new(cfg.results_path.clone())),
    };

    match state.results.records().await {
        Ok(records) => info!(
            "result log {:?} holds {} records",
            state.results.path(),
            records.len()
        ),
        Err(err) => warn!("result log {:?} is not readable yet: {err}", state.results.path()),
    }

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(cfg.addr).await?;
    info!("stats server listening on http://{}", cfg.addr);
    axum::serve(listener, app).await?;
    Ok(())
}
