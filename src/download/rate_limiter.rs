//! Byte-rate throttling for the copy loop.
//!
//! [`RateLimiter`] keeps the cumulative transfer of a single download at or
//! below a configured bytes-per-second ceiling. The copy loop calls
//! [`RateLimiter::wait`] with its running byte count before every read; the
//! limiter sleeps just long enough for that count to be "earned" at the
//! configured rate.
//!
//! # Example
//!
//! ```
//! use rget_core::download::RateLimiter;
//!
//! # async fn example() {
//! let limiter = RateLimiter::new(64 * 1024);
//! let mut transferred = 0;
//! for _ in 0..4 {
//!     limiter.wait(transferred).await;
//!     transferred += 32 * 1024;
//! }
//! # }
//! ```

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

/// Cumulative pacing limiter for one transfer.
///
/// The first `wait` call fixes the baseline (instant and byte count); later
/// calls compare the bytes moved since the baseline with what the elapsed time
/// permits. Bursts are bounded by whatever is read between two `wait` calls.
#[derive(Debug)]
pub struct RateLimiter {
    /// Ceiling in bytes per second; 0 disables throttling.
    limit: u64,

    /// Baseline captured on the first `wait`.
    /// Only the task driver calls `wait`, the lock is never contended.
    pacing: Mutex<Option<Pacing>>,
}

#[derive(Debug, Clone, Copy)]
struct Pacing {
    started: Instant,
    baseline_bytes: u64,
}

impl RateLimiter {
    /// Creates a limiter with a ceiling in bytes per second (`0` disables it).
    #[must_use]
    pub fn new(limit: u64) -> Self {
        if limit == 0 {
            debug!("creating disabled rate limiter");
        } else {
            debug!(limit_bps = limit, "creating rate limiter");
        }
        Self {
            limit,
            pacing: Mutex::new(None),
        }
    }

    /// Creates a limiter that never waits.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Returns the configured ceiling in bytes per second.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Returns whether throttling is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.limit == 0
    }

    /// Blocks until `bytes_so_far` is within the configured rate.
    ///
    /// `bytes_so_far` is the cumulative count of the transfer, which may start
    /// above zero for a resumed download. The count at the first call is the
    /// baseline, so a resumed prefix is never "paid for".
    pub async fn wait(&self, bytes_so_far: u64) {
        if self.is_disabled() {
            return;
        }

        let delay = self.delay_for(bytes_so_far, Instant::now());
        if !delay.is_zero() {
            trace!(
                bytes_so_far,
                delay_ms = delay.as_millis(),
                "throttling transfer"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn delay_for(&self, bytes_so_far: u64, now: Instant) -> Duration {
        let mut guard = self
            .pacing
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let pacing = *guard.get_or_insert(Pacing {
            started: now,
            baseline_bytes: bytes_so_far,
        });
        drop(guard);

        let moved = bytes_so_far.saturating_sub(pacing.baseline_bytes);
        #[allow(clippy::cast_precision_loss)]
        let earliest = Duration::from_secs_f64(moved as f64 / self.limit as f64);
        let elapsed = now.saturating_duration_since(pacing.started);
        earliest.saturating_sub(elapsed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_new_reports_limit() {
        let limiter = RateLimiter::new(1000);
        assert_eq!(limiter.limit(), 1000);
        assert!(!limiter.is_disabled());
        assert!(RateLimiter::disabled().is_disabled());
    }

    #[tokio::test]
    async fn test_rate_limiter_disabled_no_delay() {
        tokio::time::pause();

        let limiter = RateLimiter::disabled();
        let start = Instant::now();

        limiter.wait(0).await;
        limiter.wait(10 * 1024 * 1024).await;

        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_rate_limiter_first_wait_is_immediate() {
        tokio::time::pause();

        let limiter = RateLimiter::new(1000);
        let start = Instant::now();

        limiter.wait(0).await;

        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_rate_limiter_paces_cumulative_bytes() {
        tokio::time::pause();

        let limiter = RateLimiter::new(1000);
        let start = Instant::now();

        limiter.wait(0).await;
        // 500 bytes moved at 1000 B/s: half a second must have passed
        limiter.wait(500).await;
        assert!(start.elapsed() >= Duration::from_millis(500));
        assert!(start.elapsed() < Duration::from_millis(600));

        limiter.wait(2000).await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_rate_limiter_resumed_prefix_is_free() {
        tokio::time::pause();

        let limiter = RateLimiter::new(1000);
        let start = Instant::now();

        // Resumed at 1 MB: the prefix must not cost ~1000 seconds
        limiter.wait(1_000_000).await;
        limiter.wait(1_000_100).await;

        assert!(start.elapsed() >= Duration::from_millis(100));
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_rate_limiter_does_not_wait_when_behind_schedule() {
        tokio::time::pause();

        let limiter = RateLimiter::new(1000);
        limiter.wait(0).await;
        tokio::time::advance(Duration::from_secs(5)).await;

        let before = Instant::now();
        limiter.wait(1000).await;
        assert!(before.elapsed() < Duration::from_millis(10));
    }
}
