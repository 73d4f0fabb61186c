use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::task::JoinError;
use tracing::{debug, info, warn};

use super::history::DEFAULT_HISTORY_WINDOW_DAYS;
use super::{
    AggregateError, HistoryPoint, HistorySource, PriceMap, PriceSnapshot, PriceSource,
    RefreshRequest,
};

/// Fans one [`RefreshRequest`] out to the three price sources and the history
/// source, then merges what comes back.
///
/// The four calls run as separate tokio tasks; a source that fails as a whole
/// contributes nothing and never affects the other three.
#[derive(Clone)]
pub struct PriceAggregator {
    crypto: Arc<dyn PriceSource>,
    equity: Arc<dyn PriceSource>,
    commodity: Arc<dyn PriceSource>,
    history: Arc<dyn HistorySource>,
    history_window_days: u32,
}

impl PriceAggregator {
    pub fn new(
        crypto: Arc<dyn PriceSource>,
        equity: Arc<dyn PriceSource>,
        commodity: Arc<dyn PriceSource>,
        history: Arc<dyn HistorySource>,
    ) -> Self {
        Self {
            crypto,
            equity,
            commodity,
            history,
            history_window_days: DEFAULT_HISTORY_WINDOW_DAYS,
        }
    }

    pub fn with_history_window_days(mut self, days: u32) -> Self {
        self.history_window_days = days;
        self
    }

    pub fn history_window_days(&self) -> u32 {
        self.history_window_days
    }

    /// Run every source for `request` and merge the results by union.
    ///
    /// Returns only once all four tasks have finished. `Err` means a task
    /// panicked or was cancelled, not that data is missing.
    pub async fn fetch(&self, request: &RefreshRequest) -> Result<PriceSnapshot, AggregateError> {
        debug!(
            crypto = request.crypto.len(),
            equity = request.equity.len(),
            commodity = request.commodity.len(),
            featured = ?request.featured,
            "starting price refresh"
        );

        let crypto = spawn_prices(self.crypto.clone(), request.crypto.clone());
        let equity = spawn_prices(self.equity.clone(), request.equity.clone());
        let commodity = spawn_prices(self.commodity.clone(), request.commodity.clone());
        let history = spawn_history(
            self.history.clone(),
            request.featured.clone(),
            self.history_window_days,
        );

        let (crypto, equity, commodity, history) =
            tokio::join!(crypto, equity, commodity, history);

        let crypto = crypto.map_err(|e| join_failure("crypto", e))?;
        let equity = equity.map_err(|e| join_failure("equity", e))?;
        let commodity = commodity.map_err(|e| join_failure("commodity", e))?;
        let history = history.map_err(|e| join_failure("history", e))?;

        let mut prices = PriceMap::new();
        for partial in [crypto, equity, commodity] {
            prices.extend(partial);
        }

        info!(
            requested = request.id_count(),
            priced = prices.len(),
            history_points = history.as_ref().map(Vec::len),
            "price refresh complete"
        );

        Ok(PriceSnapshot {
            prices,
            history,
            featured_id: request.featured.clone(),
        })
    }
}

fn spawn_prices(
    source: Arc<dyn PriceSource>,
    ids: BTreeSet<String>,
) -> tokio::task::JoinHandle<PriceMap> {
    tokio::spawn(async move {
        match source.fetch_prices(&ids).await {
            Ok(prices) => prices,
            Err(err) => {
                warn!(
                    source = source.name(),
                    error = %err,
                    "price source failed; continuing without its prices"
                );
                PriceMap::new()
            }
        }
    })
}

fn spawn_history(
    source: Arc<dyn HistorySource>,
    featured: Option<String>,
    window_days: u32,
) -> tokio::task::JoinHandle<Option<Vec<HistoryPoint>>> {
    tokio::spawn(async move {
        let id = featured?;
        source.fetch_history(&id, window_days).await
    })
}

fn join_failure(task: &'static str, err: JoinError) -> AggregateError {
    let message = if err.is_panic() {
        "task panicked".to_string()
    } else {
        err.to_string()
    };
    AggregateError { task, message }
}
