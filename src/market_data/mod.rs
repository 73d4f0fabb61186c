mod aggregator;
mod builder;
mod error;
pub mod history;
mod models;
pub mod providers;
mod query;
mod rate_limit;
mod request;
pub(crate) mod response;
mod sources;

pub use aggregator::PriceAggregator;
pub use builder::PriceAggregatorBuilder;
pub use error::{AggregateError, FetchError};
pub use history::{trim_partial_day, DEFAULT_HISTORY_WINDOW_DAYS, PARTIAL_DAY_THRESHOLD_HOURS};
pub use models::{HistoryPoint, PriceMap, PriceRecord, PriceSnapshot};
pub use query::{run_query, PriceQuery, QueryResponse};
pub use rate_limit::{RateLimitConfig, RequestPacer};
pub use request::RefreshRequest;
pub use response::VendorResponse;
pub use sources::{HistorySource, NoopSource, PriceSource};
