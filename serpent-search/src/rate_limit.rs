//! Per-provider request throttling.
//!
//! Each provider owns one [`RateLimiter`] for the lifetime of the process.
//! Callers check the last request under a short lock and sleep outside it,
//! re-checking on wake. Concurrent callers are spaced one interval apart
//! and the lock is never held across the wait.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Default requests-per-minute limit for a provider.
pub const DEFAULT_REQUESTS_PER_MINUTE: i32 = 10;

#[derive(Debug)]
struct LimiterState {
    requests_per_minute: i32,
    last_request: Option<Instant>,
}

/// Enforces a minimum interval of `60s / requests_per_minute` between
/// requests. A limit of zero or less disables throttling.
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<LimiterState>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_REQUESTS_PER_MINUTE)
    }
}

impl RateLimiter {
    /// Create a limiter allowing `requests_per_minute` requests.
    pub fn new(requests_per_minute: i32) -> Self {
        Self {
            state: Mutex::new(LimiterState {
                requests_per_minute,
                last_request: None,
            }),
        }
    }

    /// Change the limit. Takes effect for the next reservation.
    pub fn set_rate_limit(&self, requests_per_minute: i32) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.requests_per_minute = requests_per_minute;
    }

    /// Current requests-per-minute limit.
    pub fn rate_limit(&self) -> i32 {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .requests_per_minute
    }

    /// Minimum spacing between requests, or `None` when throttling is off.
    pub fn min_interval(requests_per_minute: i32) -> Option<Duration> {
        if requests_per_minute <= 0 {
            return None;
        }
        Some(Duration::from_secs(60) / requests_per_minute as u32)
    }

    /// Record a request now if the interval has elapsed, otherwise return
    /// the instant the next slot opens.
    ///
    /// Returns `Ok(())` without recording if throttling is disabled.
    fn try_take(&self) -> Result<(), Instant> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let Some(interval) = Self::min_interval(state.requests_per_minute) else {
            return Ok(());
        };
        let now = Instant::now();
        if let Some(last) = state.last_request {
            let slot = last + interval;
            if slot > now {
                return Err(slot);
            }
        }
        state.last_request = Some(now);
        Ok(())
    }

    /// Wait until a request may be sent, then record it.
    ///
    /// The timestamp is committed only once the wait is over, so a caller
    /// dropped mid-wait leaves the limiter untouched.
    pub async fn acquire(&self) {
        while let Err(slot) = self.try_take() {
            let now = Instant::now();
            tracing::trace!(
                wait_ms = slot.saturating_duration_since(now).as_millis() as u64,
                "rate limit wait"
            );
            tokio::time::sleep_until(slot).await;
        }
    }
}
