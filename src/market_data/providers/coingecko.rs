//! CoinGecko crypto price provider.
//!
//! Current prices come from `/simple/price`, which accepts every coin id in a
//! single request. The featured holding's chart comes from
//! `/coins/{id}/market_chart` with daily granularity.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::{Client, IntoUrl, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::market_data::history::trim_partial_day;
use crate::market_data::response::{parse_body, price_from_value};
use crate::market_data::{
    FetchError, HistoryPoint, HistorySource, PriceMap, PriceRecord, PriceSource, VendorResponse,
};

const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";
const PROVIDER_ID: &str = "coingecko";
const USER_AGENT: &str = concat!("stashboard/", env!("CARGO_PKG_VERSION"));

/// CoinGecko crypto price provider.
///
/// No API key is required for the public endpoints, though rate limits apply.
/// Holding ids for crypto are CoinGecko coin ids (`bitcoin`, `ethereum`).
pub struct CoinGeckoPriceSource {
    client: Client,
    base_url: String,
    /// Quote currency for prices (e.g., "usd", "eur")
    quote_currency: String,
    clock: Arc<dyn Clock>,
}

impl CoinGeckoPriceSource {
    /// Creates a new CoinGecko provider with USD as the quote currency.
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Creates a new CoinGecko provider with a custom reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: COINGECKO_API_BASE.to_string(),
            quote_currency: "usd".to_string(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Points the provider at a different host (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_quote_currency(mut self, currency: impl Into<String>) -> Self {
        self.quote_currency = currency.into().to_lowercase();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// `{base}/coins/{id}/market_chart`, with `id` escaped as one path segment.
    fn market_chart_url(&self, id: &str) -> Result<Url, String> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| format!("invalid base URL: {e}"))?;
        url.path_segments_mut()
            .map_err(|()| format!("base URL cannot take a path: {}", self.base_url))?
            .pop_if_empty()
            .push("coins")
            .push(id)
            .push("market_chart");
        Ok(url)
    }

    async fn get(&self, url: impl IntoUrl, query: &[(&str, &str)]) -> Result<String, String> {
        let response = self
            .client
            .get(url)
            .query(query)
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        let body = response.text().await.map_err(|e| e.to_string())?;
        if !status.is_success() {
            return Err(format!("HTTP {status}: {}", truncate(&body)));
        }
        Ok(body)
    }
}

impl Default for CoinGeckoPriceSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify a `/simple/price` body.
///
/// A `status` object means CoinGecko refused the whole request (usually a
/// rate limit). Otherwise each coin id maps to `{currency: price}`; ids the
/// vendor does not know are simply missing.
pub fn classify_simple_price(body: &str) -> VendorResponse<serde_json::Map<String, Value>> {
    let value = match parse_body(body) {
        Ok(value) => value,
        Err(msg) => return VendorResponse::ParseError(msg),
    };
    if let Some(message) = vendor_error_message(&value) {
        return VendorResponse::VendorError(message);
    }
    match value {
        Value::Object(map) => VendorResponse::Success(map),
        other => VendorResponse::ParseError(format!("expected an object, got {}", kind_of(&other))),
    }
}

/// Classify a `/coins/{id}/market_chart` body into history points.
///
/// Entries that are not `[millis, price]` pairs are skipped.
pub fn classify_market_chart(body: &str) -> VendorResponse<Vec<HistoryPoint>> {
    let value = match parse_body(body) {
        Ok(value) => value,
        Err(msg) => return VendorResponse::ParseError(msg),
    };
    if let Some(message) = vendor_error_message(&value) {
        return VendorResponse::VendorError(message);
    }
    let Some(prices) = value.get("prices").and_then(Value::as_array) else {
        return VendorResponse::ParseError("missing prices array".to_string());
    };

    let points = prices
        .iter()
        .filter_map(|entry| {
            let pair = entry.as_array()?;
            let millis = pair.first()?.as_f64()?;
            let price = price_from_value(pair.get(1)?)?;
            let timestamp = DateTime::<Utc>::from_timestamp_millis(millis as i64)?;
            Some(HistoryPoint { timestamp, price })
        })
        .collect();
    VendorResponse::Success(points)
}

fn vendor_error_message(value: &Value) -> Option<String> {
    if let Some(status) = value.get("status") {
        let message = status
            .get("error_message")
            .and_then(Value::as_str)
            .unwrap_or("unspecified error");
        return Some(match status.get("error_code") {
            Some(code) => format!("{code}: {message}"),
            None => message.to_string(),
        });
    }
    value
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn truncate(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map(|(idx, _)| idx)
        .unwrap_or(body.len());
    &body[..end]
}

#[async_trait::async_trait]
impl PriceSource for CoinGeckoPriceSource {
    async fn fetch_prices(&self, ids: &BTreeSet<String>) -> Result<PriceMap, FetchError> {
        if ids.is_empty() {
            return Ok(PriceMap::new());
        }

        let joined = ids.iter().map(String::as_str).collect::<Vec<_>>().join(",");
        let url = format!("{}/simple/price", self.base_url);
        debug!(ids = %joined, "fetching crypto prices");

        let body = self
            .get(
                &url,
                &[
                    ("ids", joined.as_str()),
                    ("vs_currencies", self.quote_currency.as_str()),
                ],
            )
            .await
            .map_err(|msg| FetchError::batch(PROVIDER_ID, msg))?;

        let coins = classify_simple_price(&body)
            .into_result()
            .map_err(|msg| FetchError::batch(PROVIDER_ID, msg))?;

        let mut prices = PriceMap::new();
        for id in ids {
            let price = coins
                .get(id)
                .and_then(|quotes| quotes.get(&self.quote_currency))
                .and_then(price_from_value);
            match price {
                Some(price) => {
                    prices.insert(id.clone(), PriceRecord::new(price));
                }
                None => {
                    let err = FetchError::per_id(
                        PROVIDER_ID,
                        id,
                        format!("no usable {} price in response", self.quote_currency),
                    );
                    warn!(error = %err, "skipping id without price");
                }
            }
        }
        Ok(prices)
    }

    fn name(&self) -> &str {
        PROVIDER_ID
    }
}

#[async_trait::async_trait]
impl HistorySource for CoinGeckoPriceSource {
    async fn fetch_history(&self, id: &str, window_days: u32) -> Option<Vec<HistoryPoint>> {
        let days = window_days.to_string();
        let result = match self.market_chart_url(id) {
            Ok(url) => self
                .get(
                    url,
                    &[
                        ("vs_currency", self.quote_currency.as_str()),
                        ("days", days.as_str()),
                        ("interval", "daily"),
                    ],
                )
                .await
                .and_then(|body| classify_market_chart(&body).into_result()),
            Err(msg) => Err(msg),
        };

        match result {
            Ok(points) => {
                let points = trim_partial_day(points, self.clock.now());
                debug!(id, points = points.len(), "history fetched");
                Some(points)
            }
            Err(reason) => {
                let err = FetchError::history(PROVIDER_ID, id, reason);
                warn!(error = %err, "continuing without history");
                None
            }
        }
    }

    fn name(&self) -> &str {
        PROVIDER_ID
    }
}
