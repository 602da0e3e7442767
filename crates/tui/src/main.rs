mod app;
mod config;
mod error;
mod logging;
mod pages;
mod ui;

use std::sync::Arc;

use txdesk_client::{ApiClient, TransactionCache, TransactionQueries};

use crate::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;
    logging::init(&config)?;
    tracing::info!(base_url = %config.base_url, page_size = config.page_size, "starting");

    let api = ApiClient::new(&config.base_url)?;
    let cache = Arc::new(TransactionCache::new(config.stale_after()));
    let mut app = app::App::new(TransactionQueries::new(api, cache), &config);
    app.run().await?;
    Ok(())
}
