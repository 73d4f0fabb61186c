use std::sync::Arc;

use reqwest::Client;
use secrecy::ExposeSecret;
use tracing::warn;

use crate::clock::{Clock, SystemClock};
use crate::config::{MarketDataConfig, ALPHA_VANTAGE_API_KEY_ENV, METAL_PRICE_API_KEY_ENV};
use crate::market_data::providers::{
    AlphaVantagePriceSource, CoinGeckoPriceSource, MetalPriceApiSource,
};
use crate::market_data::{NoopSource, PriceAggregator, PriceSource, RateLimitConfig};

/// Builds a [`PriceAggregator`] from the `[market_data]` config section.
///
/// Vendors that need an API key fall back to a no-op source when the key is
/// missing, so their holdings show as unavailable instead of failing startup.
pub struct PriceAggregatorBuilder {
    config: MarketDataConfig,
    reporting_currency: String,
    client: Client,
    clock: Arc<dyn Clock>,
}

impl PriceAggregatorBuilder {
    pub fn new(config: MarketDataConfig) -> Self {
        Self {
            config,
            reporting_currency: "USD".to_string(),
            client: Client::new(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_reporting_currency(mut self, currency: impl Into<String>) -> Self {
        self.reporting_currency = currency.into();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> PriceAggregator {
        let coingecko = {
            let mut source = CoinGeckoPriceSource::with_client(self.client.clone())
                .with_quote_currency(&self.reporting_currency)
                .with_clock(self.clock.clone());
            if let Some(url) = &self.config.coingecko_base_url {
                source = source.with_base_url(url);
            }
            Arc::new(source)
        };

        let equity: Arc<dyn PriceSource> = match &self.config.alpha_vantage_api_key {
            Some(key) => {
                let mut source =
                    AlphaVantagePriceSource::with_client(key.expose_secret(), self.client.clone())
                        .with_rate_limit(&RateLimitConfig::fixed(
                            self.config.equity_request_delay,
                        ));
                if let Some(url) = &self.config.alpha_vantage_base_url {
                    source = source.with_base_url(url);
                }
                Arc::new(source)
            }
            None => {
                warn!(
                    env = ALPHA_VANTAGE_API_KEY_ENV,
                    "no Alpha Vantage API key configured; equity prices unavailable"
                );
                Arc::new(NoopSource)
            }
        };

        let commodity: Arc<dyn PriceSource> = match &self.config.metal_price_api_key {
            Some(key) => {
                let mut source =
                    MetalPriceApiSource::with_client(key.expose_secret(), self.client.clone())
                        .with_quote_currency(&self.reporting_currency)
                        .with_rate_limit(&RateLimitConfig::fixed(
                            self.config.commodity_request_delay,
                        ));
                if let Some(url) = &self.config.metal_price_base_url {
                    source = source.with_base_url(url);
                }
                Arc::new(source)
            }
            None => {
                warn!(
                    env = METAL_PRICE_API_KEY_ENV,
                    "no Metal Price API key configured; commodity prices unavailable"
                );
                Arc::new(NoopSource)
            }
        };

        PriceAggregator::new(coingecko.clone(), equity, commodity, coingecko)
            .with_history_window_days(self.config.history_window_days)
    }
}
