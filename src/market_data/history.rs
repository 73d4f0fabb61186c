use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::HistoryPoint;

/// Default length of the featured holding's chart.
pub const DEFAULT_HISTORY_WINDOW_DAYS: u32 = 30;

/// A trailing point younger than this many hours is a still-accumulating
/// "today" bucket.
pub const PARTIAL_DAY_THRESHOLD_HOURS: i64 = 23;

/// Sort a series oldest-first and drop a trailing point that covers a day
/// which has not closed yet, so the chart never ends on a partial value.
pub fn trim_partial_day(mut points: Vec<HistoryPoint>, now: DateTime<Utc>) -> Vec<HistoryPoint> {
    points.sort_by_key(|point| point.timestamp);
    if let Some(last) = points.last() {
        let age = now - last.timestamp;
        if age < Duration::hours(PARTIAL_DAY_THRESHOLD_HOURS) {
            debug!(
                timestamp = %last.timestamp,
                age_minutes = age.num_minutes(),
                "dropping partial-day history point"
            );
            points.pop();
        }
    }
    points
}
