//! Metal Price API provider for precious metals.
//!
//! Only gold and silver are priced. Any other commodity symbol is dropped
//! before a request is made, so unsupported holdings simply show no price.
//! Requests go out one symbol at a time with a fixed gap between them.

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

const BASE_URL: &str = "https://api.metalpriceapi.com/v1";
const PROVIDER_ID: &str = "metal_price_api";

/// Symbols this provider will request.
pub const SUPPORTED_METALS: &[&str] = &["XAU", "XAG"];

pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(2);

pub struct MetalPriceApiSource {
    api_key: SecretString,
    client: Client,
    base_url: String,
    /// ISO code prices are quoted in (e.g., "USD")
    quote_currency: String,
    pacer: RequestPacer,
}

impl MetalPriceApiSource {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(api_key, Client::new())
    }

    pub fn with_client(api_key: impl Into<String>, client: Client) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            client,
            base_url: BASE_URL.to_string(),
            quote_currency: "USD".to_string(),
            pacer: RequestPacer::new(&RateLimitConfig::fixed(DEFAULT_REQUEST_DELAY)),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_quote_currency(mut self, currency: impl Into<String>) -> Self {
        self.quote_currency = currency.into().to_uppercase();
        self
    }

    pub fn with_rate_limit(mut self, config: &RateLimitConfig) -> Self {
        self.pacer = RequestPacer::new(config);
        self
    }

    pub fn is_supported(symbol: &str) -> bool {
        SUPPORTED_METALS.contains(&symbol)
    }

    async fn fetch_latest(&self, symbol: String) -> Result<f64, FetchError> {
        let url = format!("{}/latest", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.expose_secret()),
                ("base", self.quote_currency.as_str()),
                ("currencies", symbol.as_str()),
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

        classify_latest(&body, &symbol, &self.quote_currency)
            .into_result()
            .map_err(|reason| FetchError::per_id(PROVIDER_ID, &symbol, reason))
    }
}

/// Classify a `/latest` body into a price per troy ounce.
///
/// The API reports how many ounces one unit of the base currency buys
/// (`rates.XAU`), so the price is its inverse. When the inverted quote
/// (`rates.USDXAU`) is present it is used directly.
pub fn classify_latest(body: &str, symbol: &str, base: &str) -> VendorResponse<f64> {
    let value = match parse_body(body) {
        Ok(value) => value,
        Err(msg) => return VendorResponse::ParseError(msg),
    };

    if value.get("success").and_then(Value::as_bool) == Some(false) {
        let error = value.get("error");
        let message = error
            .and_then(|e| e.get("message").or_else(|| e.get("info")))
            .and_then(Value::as_str)
            .unwrap_or("request was not successful");
        let message = match error.and_then(|e| e.get("statusCode").or_else(|| e.get("code"))) {
            Some(code) => format!("{code}: {message}"),
            None => message.to_string(),
        };
        return VendorResponse::VendorError(message);
    }

    let Some(rates) = value.get("rates") else {
        return VendorResponse::ParseError("missing rates".to_string());
    };

    if let Some(price) = rates
        .get(format!("{base}{symbol}"))
        .and_then(price_from_value)
        .filter(|price| *price > 0.0)
    {
        return VendorResponse::Success(price);
    }

    match rates.get(symbol).and_then(price_from_value) {
        Some(rate) if rate > 0.0 && (1.0 / rate).is_finite() => {
            VendorResponse::Success(1.0 / rate)
        }
        Some(rate) => VendorResponse::ParseError(format!("unusable rate {rate}")),
        None => VendorResponse::ParseError(format!("no rate for {symbol}")),
    }
}

#[async_trait::async_trait]
impl PriceSource for MetalPriceApiSource {
    async fn fetch_prices(&self, ids: &BTreeSet<String>) -> Result<PriceMap, FetchError> {
        let (supported, unsupported): (Vec<&String>, Vec<&String>) =
            ids.iter().partition(|id| Self::is_supported(id));
        if !unsupported.is_empty() {
            debug!(?unsupported, "dropping unsupported commodity symbols");
        }
        if supported.is_empty() {
            return Ok(PriceMap::new());
        }
        Ok(fetch_sequentially(PROVIDER_ID, supported, &self.pacer, |symbol| {
            self.fetch_latest(symbol)
        })
        .await)
    }

    fn name(&self) -> &str {
        PROVIDER_ID
    }
}
