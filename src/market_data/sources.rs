use std::collections::BTreeSet;
use std::future::Future;

use tracing::{debug, warn};

use super::{FetchError, HistoryPoint, PriceMap, PriceRecord, RequestPacer};

/// A vendor adapter that turns a set of ids into unit prices.
///
/// Implementations resolve every id independently: an id that cannot be
/// priced is logged and left out of the returned map. `Err` is reserved for
/// a call that failed as a whole.
#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_prices(&self, ids: &BTreeSet<String>) -> Result<PriceMap, FetchError>;

    fn name(&self) -> &str;
}

/// Price history for a single id over the trailing `window_days`.
///
/// `None` means "no chart"; it is never an error for the caller.
#[async_trait::async_trait]
pub trait HistorySource: Send + Sync {
    async fn fetch_history(&self, id: &str, window_days: u32) -> Option<Vec<HistoryPoint>>;

    fn name(&self) -> &str;
}

/// Stand-in for a vendor that is not configured (for example, no API key).
pub struct NoopSource;

#[async_trait::async_trait]
impl PriceSource for NoopSource {
    async fn fetch_prices(&self, ids: &BTreeSet<String>) -> Result<PriceMap, FetchError> {
        if !ids.is_empty() {
            debug!(count = ids.len(), "no price source configured, skipping ids");
        }
        Ok(PriceMap::new())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

#[async_trait::async_trait]
impl HistorySource for NoopSource {
    async fn fetch_history(&self, _id: &str, _window_days: u32) -> Option<Vec<HistoryPoint>> {
        None
    }

    fn name(&self) -> &str {
        "noop"
    }
}

/// Price `ids` one request at a time, waiting on `pacer` before each request.
///
/// Failures are logged per id and skipped; the remaining ids are still tried.
pub(crate) async fn fetch_sequentially<'a, F, Fut>(
    source_name: &str,
    ids: impl IntoIterator<Item = &'a String>,
    pacer: &RequestPacer,
    mut fetch_one: F,
) -> PriceMap
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<f64, FetchError>>,
{
    let mut prices = PriceMap::new();
    for id in ids {
        pacer.wait_turn().await;
        match fetch_one(id.clone()).await {
            Ok(price) => {
                debug!(source = source_name, id = %id, price, "price fetched");
                prices.insert(id.clone(), PriceRecord::new(price));
            }
            Err(err) => {
                warn!(source = source_name, id = %id, error = %err, "skipping id without price");
            }
        }
    }
    prices
}
