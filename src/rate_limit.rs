//! Fixed-window request limiter.
//!
//! One counter shared by every analysis request in the process.  Each check
//! counts; once the window has elapsed the counter and window start reset
//! before counting.  Requests over the ceiling are rejected outright, with no
//! queuing.
//!
//! The limiter is per-process and non-authoritative: restarts and multiple
//! instances each get their own budget.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;

/// Admission check injected into the analysis pipeline.
pub trait RateLimiter: Send + Sync {
    /// Count one request; `false` means it must be rejected.
    fn allow(&self) -> bool;
}

// ---------------------------------------------------------------------------
// FixedWindowLimiter
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Accepts at most `limit` requests per `window`.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    limit: u32,
    window: Duration,
    state: Mutex<Window>,
}

impl FixedWindowLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            state: Mutex::new(Window {
                started: Instant::now(),
                count: 0,
            }),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.per_minute, Duration::from_secs(config.window_secs))
    }

    /// [`RateLimiter::allow`] evaluated at an explicit instant.
    pub fn allow_at(&self, now: Instant) -> bool {
        // A poisoned lock only means another request panicked mid-update;
        // the counter is still usable.
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if now.saturating_duration_since(state.started) > self.window {
            state.started = now;
            state.count = 0;
        }
        state.count = state.count.saturating_add(1);
        state.count <= self.limit
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn allow(&self) -> bool {
        let allowed = self.allow_at(Instant::now());
        if !allowed {
            log::warn!("Rate limit of {} requests per window exceeded", self.limit);
        }
        allowed
    }
}

/// Limiter that admits everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unlimited;

impl RateLimiter for Unlimited {
    fn allow(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_after_limit_within_window() {
        let limiter = FixedWindowLimiter::new(3, Duration::from_secs(60));
        let t0 = Instant::now();

        assert!(limiter.allow_at(t0));
        assert!(limiter.allow_at(t0 + Duration::from_secs(1)));
        assert!(limiter.allow_at(t0 + Duration::from_secs(2)));
        assert!(!limiter.allow_at(t0 + Duration::from_secs(3)));
        assert!(!limiter.allow_at(t0 + Duration::from_secs(59)));
    }

    #[test]
    fn resets_after_window_elapses() {
        let limiter = FixedWindowLimiter::new(2, Duration::from_secs(60));
        let t0 = Instant::now();

        assert!(limiter.allow_at(t0));
        assert!(limiter.allow_at(t0));
        assert!(!limiter.allow_at(t0));

        let later = t0 + Duration::from_secs(61);
        assert!(limiter.allow_at(later));
        assert!(limiter.allow_at(later));
        assert!(!limiter.allow_at(later));
    }

    #[test]
    fn default_config_allows_120_per_minute() {
        let limiter = FixedWindowLimiter::from_config(&RateLimitConfig::default());
        let t0 = Instant::now();
        for i in 0..120 {
            assert!(limiter.allow_at(t0), "request {i} should pass");
        }
        assert!(!limiter.allow_at(t0));
    }

    #[test]
    fn instants_before_window_start_do_not_reset() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now() + Duration::from_secs(5);
        assert!(limiter.allow_at(start));
        // Earlier instant: saturating elapsed is zero, still same window.
        assert!(!limiter.allow_at(Instant::now()));
    }

    #[test]
    fn unlimited_always_allows() {
        let limiter: Box<dyn RateLimiter> = Box::new(Unlimited);
        assert!((0..1000).all(|_| limiter.allow()));
    }
}
