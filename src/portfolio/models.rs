use serde::Serialize;

use crate::market_data::{HistoryPoint, PriceMap, PriceSnapshot};
use crate::models::Holding;

use super::{calculate_holdings, portfolio_total};

/// How a holding's value should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceStatus {
    /// No price refresh has completed yet.
    Loading,
    Priced,
    /// Refresh finished but left this holding without a value.
    Unavailable,
    /// The last refresh failed as a whole.
    Error,
}

/// A holding together with its derived values. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedHolding {
    #[serde(flatten)]
    pub holding: Holding,
    pub unit_price: Option<f64>,
    pub total_value: Option<f64>,
    pub status: PriceStatus,
}

/// Everything the dashboard shows at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioView {
    pub holdings: Vec<CalculatedHolding>,
    pub total_value: f64,
    pub history: Option<Vec<HistoryPoint>>,
    pub featured_id: Option<String>,
    /// The last refresh failed as a whole.
    pub error: bool,
    /// A refresh is in flight; values come from the previous snapshot.
    pub refreshing: bool,
}

impl PortfolioView {
    /// Combine holdings with the latest snapshot.
    ///
    /// `snapshot` is `None` until the first refresh completes.
    pub fn build(
        holdings: &[Holding],
        snapshot: Option<&PriceSnapshot>,
        error: bool,
        refreshing: bool,
    ) -> Self {
        let empty = PriceMap::new();
        let (prices, panel) = match snapshot {
            _ if error => (snapshot.map_or(&empty, |s| &s.prices), PriceStatus::Error),
            Some(snapshot) => (&snapshot.prices, PriceStatus::Priced),
            None => (&empty, PriceStatus::Loading),
        };
        let holdings = calculate_holdings(holdings, prices, panel);
        let total_value = portfolio_total(&holdings);
        Self {
            holdings,
            total_value,
            history: snapshot.and_then(|s| s.history.clone()),
            featured_id: snapshot.and_then(|s| s.featured_id.clone()),
            error,
            refreshing,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.holdings
            .iter()
            .any(|h| h.status == PriceStatus::Loading)
    }
}
