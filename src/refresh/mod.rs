//! Deciding when prices need fetching, and fetching them one run at a time.

mod controller;
mod planner;

pub use controller::{RefreshController, RefreshHandle, RefreshOutcome, RefreshState};
pub use planner::{plan_refresh, RefreshPlan, RefreshReason};
