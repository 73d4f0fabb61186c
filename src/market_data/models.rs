use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current price of one unit of a holding, in the reporting currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub price: f64,
}

impl PriceRecord {
    pub fn new(price: f64) -> Self {
        Self { price }
    }
}

/// Holding id -> current unit price. Rebuilt wholesale on every refresh.
pub type PriceMap = BTreeMap<String, PriceRecord>;

/// One closed period of the featured holding's price history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Result of one aggregator run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSnapshot {
    pub prices: PriceMap,
    pub history: Option<Vec<HistoryPoint>>,
    pub featured_id: Option<String>,
}

impl PriceSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }
}
