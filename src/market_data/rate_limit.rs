//! Request pacing for vendors with per-minute call ceilings.
//!
//! The equity and commodity vendors are called once per symbol, one call at a
//! time, with a fixed gap between calls. The gap is policy: it keeps a free
//! API key under its ceiling and applies to every request the adapter makes,
//! including consecutive refreshes.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Minimum time between two consecutive requests to the same vendor.
    pub request_delay: Duration,
}

impl RateLimitConfig {
    pub fn fixed(request_delay: Duration) -> Self {
        Self { request_delay }
    }
}

/// Releases requests no faster than the configured delay.
///
/// The lock is held while waiting, so concurrent callers queue up behind
/// each other rather than firing together once the gap elapses.
#[derive(Debug)]
pub struct RequestPacer {
    delay: Duration,
    last_release: Mutex<Option<Instant>>,
}

impl RequestPacer {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            delay: config.request_delay,
            last_release: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait until the next request may be sent, then claim the slot.
    pub async fn wait_turn(&self) {
        let mut last_release = self.last_release.lock().await;
        if let Some(previous) = *last_release {
            let ready_at = previous + self.delay;
            let now = Instant::now();
            if ready_at > now {
                debug!(
                    wait_ms = (ready_at - now).as_millis() as u64,
                    "pacing request to respect vendor rate limit"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last_release = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_request_is_not_delayed() {
        let pacer = RequestPacer::new(&RateLimitConfig::fixed(Duration::from_secs(13)));
        let start = Instant::now();
        pacer.wait_turn().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_requests_are_spaced() {
        let pacer = RequestPacer::new(&RateLimitConfig::fixed(Duration::from_secs(13)));
        let start = Instant::now();
        for _ in 0..3 {
            pacer.wait_turn().await;
        }
        assert!(start.elapsed() >= Duration::from_secs(26));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gap_already_elapsed_is_not_waited_again() {
        let pacer = RequestPacer::new(&RateLimitConfig::fixed(Duration::from_secs(5)));
        pacer.wait_turn().await;
        tokio::time::advance(Duration::from_secs(10)).await;
        let before = Instant::now();
        pacer.wait_turn().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}
