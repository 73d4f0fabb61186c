//! Alpha Vantage equity price provider.
//!
//! Uses the GLOBAL_QUOTE endpoint, one symbol per request. The free tier
//! allows 5 requests per minute, so requests are paced (13 seconds apart by
//! default) and issued strictly one after another.

use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use crate::market_data::response::{parse_body, price_from_value};
use crate::market_data::sources::fetch_sequentially;
use crate::market_data::{
    FetchError, PriceMap, PriceSource, RateLimitConfig, RequestPacer, VendorResponse,
};

const BASE_URL: &str = "https://www.alphavantage.co";
const PROVIDER_ID: &str = "alpha_vantage";

/// Gap between two requests; keeps a free key under 5 calls per minute.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(13);

/// Alpha Vantage provider for equity prices.
pub struct AlphaVantagePriceSource {
    api_key: SecretString,
    client: Client,
    base_url: String,
    pacer: RequestPacer,
}

impl AlphaVantagePriceSource {
    /// Create a new Alpha Vantage price source with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(api_key, Client::new())
    }

    /// Create a new Alpha Vantage price source with a custom reqwest client.
    pub fn with_client(api_key: impl Into<String>, client: Client) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            client,
            base_url: BASE_URL.to_string(),
            pacer: RequestPacer::new(&RateLimitConfig::fixed(DEFAULT_REQUEST_DELAY)),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_rate_limit(mut self, config: &RateLimitConfig) -> Self {
        self.pacer = RequestPacer::new(config);
        self
    }

    async fn fetch_quote(&self, symbol: String) -> Result<f64, FetchError> {
        let url = format!("{}/query", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol.as_str()),
                ("apikey", self.api_key.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::per_id(PROVIDER_ID, &symbol, e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::per_id(
                PROVIDER_ID,
                &symbol,
                format!("HTTP {}", response.status()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::per_id(PROVIDER_ID, &symbol, e.to_string()))?;

        classify_global_quote(&body)
            .into_result()
            .map_err(|reason| FetchError::per_id(PROVIDER_ID, &symbol, reason))
    }
}

/// Classify a GLOBAL_QUOTE body.
///
/// Alpha Vantage answers rate limits (`Note`, `Information`) and bad requests
/// (`Error Message`) with HTTP 200, so those keys are checked before the
/// quote. An unknown symbol yields an empty `Global Quote` object.
pub fn classify_global_quote(body: &str) -> VendorResponse<f64> {
    let value = match parse_body(body) {
        Ok(value) => value,
        Err(msg) => return VendorResponse::ParseError(msg),
    };

    for key in ["Error Message", "Note", "Information"] {
        if let Some(message) = value.get(key).and_then(Value::as_str) {
            return VendorResponse::VendorError(message.to_string());
        }
    }

    let Some(quote) = value.get("Global Quote") else {
        return VendorResponse::ParseError("missing Global Quote".to_string());
    };
    match quote.get("05. price") {
        Some(raw) => match price_from_value(raw) {
            Some(price) => VendorResponse::Success(price),
            None => VendorResponse::ParseError(format!("unusable price {raw}")),
        },
        None => VendorResponse::ParseError("quote has no price (unknown symbol?)".to_string()),
    }
}

#[async_trait::async_trait]
impl PriceSource for AlphaVantagePriceSource {
    async fn fetch_prices(&self, ids: &BTreeSet<String>) -> Result<PriceMap, FetchError> {
        if ids.is_empty() {
            return Ok(PriceMap::new());
        }
        debug!(
            count = ids.len(),
            delay_ms = self.pacer.delay().as_millis() as u64,
            "fetching equity quotes sequentially"
        );
        Ok(fetch_sequentially(PROVIDER_ID, ids, &self.pacer, |symbol| self.fetch_quote(symbol)).await)
    }

    fn name(&self) -> &str {
        PROVIDER_ID
    }
}
