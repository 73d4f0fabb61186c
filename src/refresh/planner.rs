use std::fmt;

use crate::market_data::RefreshRequest;
use crate::models::Holding;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    /// Nothing has been fetched yet.
    FirstRun,
    /// The needed ids or the featured id differ from the last completed run.
    IdsChanged,
    /// No holdings are left but prices from earlier holdings are still cached.
    ClearStale,
}

impl fmt::Display for RefreshReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RefreshReason::FirstRun => "first_run",
            RefreshReason::IdsChanged => "ids_changed",
            RefreshReason::ClearStale => "clear_stale",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshPlan {
    pub request: RefreshRequest,
    pub reason: RefreshReason,
}

/// Decide whether `holdings` need a new aggregator run.
///
/// `last_completed` is the request of the last run that finished, whether it
/// succeeded or not. Returns `None` when the cached prices already answer
/// for exactly these holdings.
pub fn plan_refresh(
    holdings: &[Holding],
    last_completed: Option<&RefreshRequest>,
    has_cached_prices: bool,
) -> Option<RefreshPlan> {
    let request = RefreshRequest::from_holdings(holdings);
    let reason = match last_completed {
        None => RefreshReason::FirstRun,
        Some(last) if *last != request => RefreshReason::IdsChanged,
        Some(_) if holdings.is_empty() && has_cached_prices => RefreshReason::ClearStale,
        Some(_) => return None,
    };
    Some(RefreshPlan { request, reason })
}
