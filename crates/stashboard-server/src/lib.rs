//! HTTP surface of the price query.
//!
//! `GET /api/prices?crypto=a,b&equity=X&commodity=XAU` answers with the
//! query response as JSON: 200 when the refresh ran, 500 (with an empty
//! price map and `error` set) when it failed as a whole.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use stashboard::market_data::{run_query, PriceAggregator, PriceQuery, QueryResponse};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

#[derive(Clone)]
pub struct AppState {
    aggregator: Arc<PriceAggregator>,
}

impl AppState {
    pub fn new(aggregator: PriceAggregator) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/prices", get(prices))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn prices(
    State(state): State<AppState>,
    Query(query): Query<PriceQuery>,
) -> (StatusCode, Json<QueryResponse>) {
    debug!(?query, "price query");
    let response = run_query(&state.aggregator, &query).await;
    let status = if response.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(response))
}
