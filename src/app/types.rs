use serde::Serialize;

use crate::market_data::HistoryPoint;
use crate::models::{Holding, HoldingKind};

/// JSON output for stored holdings
#[derive(Debug, Serialize)]
pub struct HoldingOutput {
    pub id: String,
    pub kind: HoldingKind,
    pub name: String,
    pub ticker: String,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_value: Option<f64>,
}

impl From<&Holding> for HoldingOutput {
    fn from(holding: &Holding) -> Self {
        Self {
            id: holding.id.to_string(),
            kind: holding.kind,
            name: holding.label().to_string(),
            ticker: holding.ticker_label.clone(),
            quantity: holding.quantity,
            purchase_value: holding.purchase_value,
            manual_value: holding.manual_value,
        }
    }
}

/// One row of the valuation table. Amounts are display strings.
#[derive(Debug, Serialize)]
pub struct ValuedHoldingOutput {
    pub id: String,
    pub kind: HoldingKind,
    pub name: String,
    pub quantity: String,
    pub unit_price: String,
    pub total_value: String,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HistorySummary {
    pub id: String,
    pub points: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<HistoryPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<HistoryPoint>,
    /// Change from first to last point, in percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ValueOutput {
    pub reporting_currency: String,
    pub holdings: Vec<ValuedHoldingOutput>,
    pub total_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<HistorySummary>,
    pub error: bool,
}
