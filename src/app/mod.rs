//! Command implementations shared by the CLI and the HTTP server.

mod config;
mod mutations;
mod types;
mod value;

use std::sync::Arc;

use crate::config::ResolvedConfig;
use crate::market_data::{PriceAggregator, PriceAggregatorBuilder};
use crate::storage::{HoldingsStore, JsonFileBackend};

pub use config::config_output;
pub use mutations::{add_holding, list_holdings, remove_holding};
pub use types::{HistorySummary, HoldingOutput, ValueOutput, ValuedHoldingOutput};
pub use value::{render_value_table, value_output, value_portfolio};

/// Holdings store over the configured data directory.
pub fn open_store(config: &ResolvedConfig) -> HoldingsStore {
    HoldingsStore::new(Arc::new(JsonFileBackend::new(&config.data_dir)))
}

pub fn build_aggregator(config: &ResolvedConfig) -> PriceAggregator {
    PriceAggregatorBuilder::new(config.market_data.clone())
        .with_reporting_currency(&config.reporting_currency)
        .build()
}
