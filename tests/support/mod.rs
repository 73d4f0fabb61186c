#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use stashboard::market_data::{
    FetchError, HistoryPoint, HistorySource, NoopSource, PriceAggregator, PriceMap, PriceRecord,
    PriceSource,
};
use stashboard::models::{Holding, HoldingKind, NewHolding};

/// Price source answering from a fixed table and recording every call.
pub struct MockPriceSource {
    prices: Mutex<PriceMap>,
    calls: AtomicUsize,
    requested: Mutex<Vec<BTreeSet<String>>>,
    delay: Duration,
}

impl MockPriceSource {
    pub fn new(prices: &[(&str, f64)]) -> Arc<Self> {
        Self::with_delay(prices, Duration::ZERO)
    }

    pub fn with_delay(prices: &[(&str, f64)], delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            prices: Mutex::new(
                prices
                    .iter()
                    .map(|(id, price)| (id.to_string(), PriceRecord::new(*price)))
                    .collect(),
            ),
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
            delay,
        })
    }

    pub fn set_price(&self, id: &str, price: f64) {
        self.prices
            .lock()
            .unwrap()
            .insert(id.to_string(), PriceRecord::new(price));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<BTreeSet<String>> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    async fn fetch_prices(&self, ids: &BTreeSet<String>) -> Result<PriceMap, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(ids.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let prices = self.prices.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| prices.get(id).map(|record| (id.clone(), *record)))
            .collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Source whose task panics, standing in for a bug inside the fetch group.
pub struct PanickingSource;

#[async_trait]
impl PriceSource for PanickingSource {
    async fn fetch_prices(&self, ids: &BTreeSet<String>) -> Result<PriceMap, FetchError> {
        if ids.is_empty() {
            return Ok(PriceMap::new());
        }
        panic!("price source bug");
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

/// Source that always fails as a whole.
pub struct FailingSource;

#[async_trait]
impl PriceSource for FailingSource {
    async fn fetch_prices(&self, _ids: &BTreeSet<String>) -> Result<PriceMap, FetchError> {
        Err(FetchError::batch("failing", "HTTP 503 Service Unavailable"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

pub struct MockHistorySource {
    points: Option<Vec<HistoryPoint>>,
    calls: AtomicUsize,
}

impl MockHistorySource {
    pub fn new(points: Option<Vec<HistoryPoint>>) -> Arc<Self> {
        Arc::new(Self {
            points,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistorySource for MockHistorySource {
    async fn fetch_history(&self, _id: &str, _window_days: u32) -> Option<Vec<HistoryPoint>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.points.clone()
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Aggregator with `crypto` for crypto ids and no-op sources elsewhere.
pub fn crypto_only(crypto: Arc<MockPriceSource>) -> PriceAggregator {
    PriceAggregator::new(
        crypto,
        Arc::new(NoopSource),
        Arc::new(NoopSource),
        Arc::new(NoopSource),
    )
}

pub fn holding(kind: HoldingKind, id: &str, quantity: f64) -> Holding {
    NewHolding::new(kind, id)
        .with_id(id)
        .with_quantity(quantity)
        .into_holding()
        .unwrap()
}
