//! Refresh query: three comma-separated id lists in, one merged snapshot out.

use serde::{Deserialize, Serialize};
use tracing::error;

use super::{HistoryPoint, PriceAggregator, PriceMap, RefreshRequest};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuery {
    #[serde(default)]
    pub crypto: Option<String>,
    #[serde(default)]
    pub equity: Option<String>,
    #[serde(default)]
    pub commodity: Option<String>,
}

impl PriceQuery {
    pub fn to_request(&self) -> RefreshRequest {
        RefreshRequest::from_query(
            self.crypto.as_deref(),
            self.equity.as_deref(),
            self.commodity.as_deref(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub price_map: PriceMap,
    pub history_series: Option<Vec<HistoryPoint>>,
    pub featured_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResponse {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Answer a query. Aggregate failures come back as an empty response with
/// `error` set rather than as `Err`.
pub async fn run_query(aggregator: &PriceAggregator, query: &PriceQuery) -> QueryResponse {
    let request = query.to_request();
    match aggregator.fetch(&request).await {
        Ok(snapshot) => QueryResponse {
            price_map: snapshot.prices,
            history_series: snapshot.history,
            featured_id: snapshot.featured_id,
            error: None,
        },
        Err(err) => {
            error!(error = %err, "price query failed");
            QueryResponse {
                featured_id: request.featured,
                error: Some(err.to_string()),
                ..QueryResponse::default()
            }
        }
    }
}
