//! Retry policy: bounded exponential backoff with jitter and `Retry-After` override.

use rand::Rng;
use std::time::Duration;

/// Errors classified as retryable by [`Retrier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryableError {
    HttpStatus(u16),
    ConnectionReset,
    TimedOut,
    NotFound,
    SocketHangUp,
    Other,
}

impl RetryableError {
    #[must_use]
    pub fn is_retryable(self) -> bool {
        match self {
            RetryableError::HttpStatus(code) => {
                matches!(code, 429 | 500 | 502 | 503 | 504)
            }
            RetryableError::ConnectionReset
            | RetryableError::TimedOut
            | RetryableError::NotFound
            | RetryableError::SocketHangUp => true,
            RetryableError::Other => false,
        }
    }
}

/// Configuration for [`Retrier`].
#[derive(Debug, Clone, Copy)]
pub struct RetrierConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetrierConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

/// Computes delay-before-next-attempt policy. Does not itself perform I/O or
/// retries — callers drive the attempt loop and ask this for each delay.
pub struct Retrier {
    config: RetrierConfig,
}

impl Retrier {
    #[must_use]
    pub fn new(config: RetrierConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// Delay before attempt `k` (0-indexed, so `k=0` is the delay before the
    /// *first* retry). `retry_after` overrides the computed delay when present.
    #[must_use]
    pub fn delay_for_attempt(&self, k: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(explicit) = retry_after {
            return explicit;
        }
        let base_ms = self.config.initial_delay.as_millis() as f64
            * self.config.backoff_multiplier.powi(k as i32);
        let capped_ms = base_ms.min(self.config.max_delay.as_millis() as f64);
        let jitter_fraction: f64 = rand::thread_rng().gen_range(0.0..0.30);
        let with_jitter_ms = capped_ms * (1.0 + jitter_fraction);
        Duration::from_millis(with_jitter_ms.min(self.config.max_delay.as_millis() as f64 * 1.30) as u64)
    }
}
