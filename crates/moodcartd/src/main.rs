//! Moodcart daemon entry point.

use anyhow::Result;
use moodcart_common::MarketConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("moodcartd v{} starting", env!("CARGO_PKG_VERSION"));

    let config = MarketConfig::load();
    info!(
        "Currency: {} ({}), catalog A: {}, model: {}",
        config.currency.code, config.currency.symbol, config.catalog_a.base_url, config.llm.model
    );

    moodcartd::server::run(config).await
}
