//! Failure kinds of the market data layer.
//!
//! Only [`FetchError::Batch`] and [`AggregateError`] ever cross a function
//! boundary as `Err`; per-id failures and missing history are built for
//! structured logging and then absorbed by the adapter that hit them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    /// One id could not be priced. The id is left out of the result.
    #[error("{source_name}: no price for {id}: {reason}")]
    PerId {
        source_name: String,
        id: String,
        reason: String,
    },

    /// The adapter's call failed as a whole. The caller continues with an
    /// empty mapping for this adapter only.
    #[error("{source_name}: batch request failed: {message}")]
    Batch {
        source_name: String,
        message: String,
    },

    /// No history series for the featured holding; the chart stays empty.
    #[error("{source_name}: history for {id} unavailable: {reason}")]
    HistoryUnavailable {
        source_name: String,
        id: String,
        reason: String,
    },
}

impl FetchError {
    pub fn per_id(source_name: &str, id: &str, reason: impl Into<String>) -> Self {
        FetchError::PerId {
            source_name: source_name.to_string(),
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn batch(source_name: &str, message: impl Into<String>) -> Self {
        FetchError::Batch {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    pub fn history(source_name: &str, id: &str, reason: impl Into<String>) -> Self {
        FetchError::HistoryUnavailable {
            source_name: source_name.to_string(),
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

/// The parallel fetch group itself broke (a task panicked or was aborted).
///
/// This is a bug rather than missing data; callers degrade to an empty price
/// map and flag the whole price panel as errored.
#[derive(Error, Debug)]
#[error("price refresh aborted: {task} task failed: {message}")]
pub struct AggregateError {
    pub task: &'static str,
    pub message: String,
}
