//! Adaptive token-bucket rate limiting for exchange calls.
//!
//! Built on the same `governor` token bucket as the reference workspace's
//! static `ClobRateLimiter`, wrapped with an adaptive layer that ramps the
//! refill rate up on success and backs it off on errors — 429s halve it,
//! any other error multiplies it by 0.8, and it never drops below `min_rate`.

use governor::{
    clock::DefaultClock,
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use parking_lot::RwLock;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

type GovernorLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Configuration for the adaptive rate limiter.
#[derive(Debug, Clone, Copy)]
pub struct RateLimiterConfig {
    /// Starting refill rate, in tokens/second.
    pub initial_rate: NonZeroU32,
    /// Ceiling the ramp-up may not exceed.
    pub max_rate: NonZeroU32,
    /// Floor the back-off may not go below.
    pub min_rate: NonZeroU32,
    /// Bucket capacity (burst size).
    pub capacity: NonZeroU32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            initial_rate: NonZeroU32::new(30).expect("30 > 0"),
            max_rate: NonZeroU32::new(60).expect("60 > 0"),
            min_rate: NonZeroU32::new(2).expect("2 > 0"),
            capacity: NonZeroU32::new(30).expect("30 > 0"),
        }
    }
}

impl RateLimiterConfig {
    #[must_use]
    pub fn conservative() -> Self {
        Self {
            initial_rate: NonZeroU32::new(15).expect("15 > 0"),
            max_rate: NonZeroU32::new(30).expect("30 > 0"),
            min_rate: NonZeroU32::new(1).expect("1 > 0"),
            capacity: NonZeroU32::new(15).expect("15 > 0"),
        }
    }
}

/// Outcome fed back into [`AdaptiveRateLimiter::on_result`] after a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    RateLimited,
    Error,
}

/// Token-bucket rate limiter whose refill rate adapts to observed call outcomes.
pub struct AdaptiveRateLimiter {
    limiter: RwLock<Arc<GovernorLimiter>>,
    capacity: NonZeroU32,
    min_rate: NonZeroU32,
    max_rate: NonZeroU32,
    current_rate_millis: AtomicU32,
}

impl AdaptiveRateLimiter {
    #[must_use]
    pub fn new(config: RateLimiterConfig) -> Self {
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(config.initial_rate)));
        Self {
            limiter: RwLock::new(limiter),
            capacity: config.capacity,
            min_rate: config.min_rate,
            max_rate: config.max_rate,
            current_rate_millis: AtomicU32::new(config.initial_rate.get() * 1000),
        }
    }

    /// Current refill rate, in tokens/second.
    #[must_use]
    pub fn current_rate(&self) -> f64 {
        f64::from(self.current_rate_millis.load(Ordering::Relaxed)) / 1000.0
    }

    /// Suspends until `n` tokens are available. `place_order` costs 2;
    /// every other call-site costs 1.
    pub async fn acquire(&self, n: u32) {
        let n = NonZeroU32::new(n).unwrap_or_else(|| NonZeroU32::new(1).expect("1 > 0"));
        let limiter = self.limiter.read().clone();
        if limiter.until_n_ready(n).await.is_err() {
            tracing::warn!(n = n.get(), "rate limiter burst capacity smaller than requested tokens");
        }
    }

    /// Non-blocking check: consumes `n` tokens if immediately available.
    #[must_use]
    pub fn try_acquire(&self, n: u32) -> bool {
        let Some(n) = NonZeroU32::new(n) else {
            return true;
        };
        matches!(self.limiter.read().check_n(n), Ok(Ok(())))
    }

    /// Feeds back a call outcome, adjusting the refill rate:
    /// - success: ramp 1.05x, capped at `max_rate`
    /// - 429: halve
    /// - any other error: multiply by 0.8
    /// floored at `min_rate` in all cases.
    pub fn on_result(&self, outcome: CallOutcome) {
        let current = self.current_rate();
        let next = match outcome {
            CallOutcome::Success => current * 1.05,
            CallOutcome::RateLimited => current * 0.5,
            CallOutcome::Error => current * 0.8,
        };
        let clamped = next
            .max(f64::from(self.min_rate.get()))
            .min(f64::from(self.max_rate.get()));
        self.current_rate_millis
            .store((clamped * 1000.0) as u32, Ordering::Relaxed);

        let Some(rounded) = NonZeroU32::new(clamped.round().max(1.0) as u32) else {
            return;
        };
        let new_limiter = Arc::new(
            RateLimiter::direct(Quota::per_second(rounded).allow_burst(self.capacity)),
        );
        *self.limiter.write() = new_limiter;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn success_ramps_rate_up() {
        let limiter = AdaptiveRateLimiter::new(RateLimiterConfig::default());
        let before = limiter.current_rate();
        limiter.on_result(CallOutcome::Success);
        assert!(limiter.current_rate() > before);
    }

    #[test]
    fn rate_limited_halves_rate() {
        let limiter = AdaptiveRateLimiter::new(RateLimiterConfig::default());
        let before = limiter.current_rate();
        limiter.on_result(CallOutcome::RateLimited);
        assert!((limiter.current_rate() - before / 2.0).abs() < 0.01);
    }

    #[test]
    fn other_error_multiplies_by_point_eight() {
        let limiter = AdaptiveRateLimiter::new(RateLimiterConfig::default());
        let before = limiter.current_rate();
        limiter.on_result(CallOutcome::Error);
        assert!((limiter.current_rate() - before * 0.8).abs() < 0.01);
    }

    #[test]
    fn rate_never_exceeds_max() {
        let limiter = AdaptiveRateLimiter::new(RateLimiterConfig::default());
        for _ in 0..200 {
            limiter.on_result(CallOutcome::Success);
        }
        assert!(limiter.current_rate() <= 60.0);
    }

    #[test]
    fn rate_never_drops_below_min() {
        let limiter = AdaptiveRateLimiter::new(RateLimiterConfig::default());
        for _ in 0..200 {
            limiter.on_result(CallOutcome::RateLimited);
        }
        assert!(limiter.current_rate() >= 2.0);
    }

    #[tokio::test]
    async fn acquire_completes_quickly_when_tokens_available() {
        let limiter = AdaptiveRateLimiter::new(RateLimiterConfig::default());
        let start = Instant::now();
        limiter.acquire(1).await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn try_acquire_consumes_token_then_fails() {
        let config = RateLimiterConfig {
            initial_rate: NonZeroU32::new(1).unwrap(),
            max_rate: NonZeroU32::new(1).unwrap(),
            min_rate: NonZeroU32::new(1).unwrap(),
            capacity: NonZeroU32::new(1).unwrap(),
        };
        let limiter = AdaptiveRateLimiter::new(config);
        assert!(limiter.try_acquire(1));
        assert!(!limiter.try_acquire(1));
    }

    #[test]
    fn try_acquire_consumes_n_tokens_at_once() {
        let config = RateLimiterConfig {
            initial_rate: NonZeroU32::new(4).unwrap(),
            max_rate: NonZeroU32::new(4).unwrap(),
            min_rate: NonZeroU32::new(1).unwrap(),
            capacity: NonZeroU32::new(4).unwrap(),
        };
        let limiter = AdaptiveRateLimiter::new(config);
        assert!(limiter.try_acquire(2));
        assert!(limiter.try_acquire(2));
        assert!(!limiter.try_acquire(1));
    }
}
