//! Per-holding valuation rules.
//!
//! Rules are tried in order and the first that applies wins:
//!
//! 1. A priced kind with an entry in the price map is worth
//!    `quantity * price`.
//! 2. Real estate with a manual value is worth that value.
//! 3. "Other" holdings are worth their purchase value, or
//!    `quantity * OTHER_PLACEHOLDER_UNIT_VALUE` when none is recorded.
//! 4. Anything else has no value (shown as unavailable).
//!
//! Rules 2 and 3 derive the unit price as `total / quantity` when the
//! quantity is positive.

use crate::market_data::PriceMap;
use crate::models::{Holding, HoldingKind};

use super::{CalculatedHolding, PriceStatus};

/// Stand-in unit value for "other" holdings without a purchase value.
///
/// This is a placeholder, not a valuation: there is no market source for the
/// category. Replace it once a real policy exists.
pub const OTHER_PLACEHOLDER_UNIT_VALUE: f64 = 50.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Valuation {
    pub unit_price: Option<f64>,
    pub total_value: Option<f64>,
}

impl Valuation {
    fn from_total(total_value: f64, quantity: f64) -> Self {
        let unit_price = (quantity > 0.0).then(|| total_value / quantity);
        Self {
            unit_price,
            total_value: Some(total_value),
        }
    }
}

pub fn value_holding(holding: &Holding, prices: &PriceMap) -> Valuation {
    match holding.kind {
        HoldingKind::Crypto | HoldingKind::Equity | HoldingKind::Commodity => {
            match prices.get(&holding.price_key()) {
                Some(record) => Valuation {
                    unit_price: Some(record.price),
                    total_value: Some(holding.quantity * record.price),
                },
                None => Valuation::default(),
            }
        }
        HoldingKind::RealEstate => match holding.manual_value {
            Some(total) => Valuation::from_total(total, holding.quantity),
            None => Valuation::default(),
        },
        HoldingKind::Other => {
            let total = holding
                .purchase_value
                .unwrap_or(holding.quantity * OTHER_PLACEHOLDER_UNIT_VALUE);
            Valuation::from_total(total, holding.quantity)
        }
    }
}

/// Value every holding against `prices`.
///
/// `prices_status` is the state of the price panel: it decides how priced
/// kinds without a value are labelled. Kinds valued locally never show as
/// loading or errored.
pub fn calculate_holdings(
    holdings: &[Holding],
    prices: &PriceMap,
    prices_status: PriceStatus,
) -> Vec<CalculatedHolding> {
    holdings
        .iter()
        .map(|holding| {
            let valuation = value_holding(holding, prices);
            let status = match prices_status {
                PriceStatus::Loading | PriceStatus::Error if holding.kind.is_fetchable() => {
                    prices_status
                }
                _ if valuation.total_value.is_some() => PriceStatus::Priced,
                _ => PriceStatus::Unavailable,
            };
            CalculatedHolding {
                holding: holding.clone(),
                unit_price: valuation.unit_price,
                total_value: valuation.total_value,
                status,
            }
        })
        .collect()
}

/// Sum of all totals; holdings without a value count as zero.
pub fn portfolio_total(holdings: &[CalculatedHolding]) -> f64 {
    holdings.iter().filter_map(|h| h.total_value).sum()
}
