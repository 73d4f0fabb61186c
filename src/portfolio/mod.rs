mod models;
mod service;
pub mod valuation;

pub use models::*;
pub use service::PortfolioService;
pub use valuation::{
    calculate_holdings, portfolio_total, value_holding, Valuation, OTHER_PLACEHOLDER_UNIT_VALUE,
};
