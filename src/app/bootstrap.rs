use std::collections::HashSet;
use std::sync::Arc;

use log::{info, warn};

use crate::app::controller::{shutdown_signal, IngestController};
use crate::cli::Cli;
use crate::config::{load_config, LoggingConfig, MarketFilter};
use crate::error::{AppError, Context, Result};
use crate::fetch::{BittrexClient, MarketDataSource};
use crate::pipeline::PipelineContext;
use crate::records::{MarketId, MarketListing};
use crate::storage::PgStore;

/// Entry point used by `main`: wire config, storage and the exchange client, then poll
/// until Ctrl-C or SIGTERM.
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli.config)?;
    init_logging(&config.logging);
    info!(
        "Loaded {} config from {}",
        config.exchange.name,
        cli.config.display()
    );

    let store = PgStore::connect(&config.database)
        .await
        .context("Failed to connect to the database")?;
    info!("Connected to the database");

    let client = BittrexClient::new(&config.exchange)?;
    let listings = client
        .list_markets()
        .await
        .context("Failed to list exchange markets")?;
    let universe = select_markets(listings, &config.markets);
    if universe.is_empty() {
        store.close().await;
        return Err(AppError::message(
            "No markets left to poll after applying the market filter",
        ));
    }
    info!("Polling {} markets", universe.len());

    let ctx = PipelineContext::new(Arc::new(client), Arc::new(store.clone()));
    let controller = IngestController::new(ctx, universe, config.enabled_pipelines())?;
    let outcome = controller.run_until(shutdown_signal()).await;

    store.close().await;
    outcome
}

/// `RUST_LOG` wins over the configured level.
pub fn init_logging(config: &LoggingConfig) {
    let env = env_logger::Env::default().default_filter_or(config.level.as_str());
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}

/// Reduce the exchange listing to the market universe, keeping listing order.
pub fn select_markets(listings: Vec<MarketListing>, filter: &MarketFilter) -> Vec<MarketId> {
    let include: HashSet<String> = filter
        .include
        .iter()
        .map(|name| name.to_uppercase())
        .collect();

    let mut matched = HashSet::new();
    let markets: Vec<MarketId> = listings
        .into_iter()
        .filter(|listing| !filter.only_active || listing.is_active)
        .filter(|listing| {
            include.is_empty() || include.contains(&listing.market.as_str().to_uppercase())
        })
        .map(|listing| {
            matched.insert(listing.market.as_str().to_uppercase());
            listing.market
        })
        .collect();

    for name in include.difference(&matched) {
        warn!("Configured market {name} is not listed (or inactive); skipping it");
    }

    markets
}
