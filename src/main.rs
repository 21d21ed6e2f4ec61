use crate::config::AppConfig;
use crate::db::{init_db, Database};
use crate::router::{handle, AppState};
use crate::search::SearchService;
use anyhow::Context;
use astra::Server;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod domain;
mod enrich;
mod errors;
mod pipeline;
mod providers;
mod responses;
mod router;
mod scoring;
mod search;
mod spreadsheets;
mod templates;

#[cfg(test)]
mod tests;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("deal_finder=info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let db = Database::new(&config.database_path);
    init_db(&db).context("database initialization failed")?;

    let service = SearchService::from_config(&config).context("failed to build provider clients")?;
    if !service.is_search_configured() {
        warn!("ZILLOW_API_KEY not set, searches will fail until it is configured");
    }
    info!(
        realtor = config.realtor_api_key.is_some(),
        workers = config.pipeline.workers,
        freshness_days = config.pipeline.freshness_days,
        "pipeline configured"
    );

    let addr = config.bind_addr;
    let state = AppState {
        db,
        service,
        config,
    };

    info!(%addr, "starting server");
    let server = Server::bind(&addr).max_workers(8);

    server
        .serve(move |req, _info| match handle(req, &state) {
            Ok(resp) => resp,
            Err(err) => {
                warn!(error = %err, "request failed");
                templates::html_error_response(err)
            }
        })
        .context("server ended with error")?;

    info!("server shut down cleanly");
    Ok(())
}
