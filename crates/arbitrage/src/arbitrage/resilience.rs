//! The single chokepoint every `ExchangeClient` call-site routes through:
//! circuit breaker admission, rate-limiter token acquisition, and retry with
//! backoff, feeding the outcome back into both the breaker and the limiter.

use std::future::Future;

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use super::exchange_client::ExchangeError;
use super::rate_limiter::{AdaptiveRateLimiter, CallOutcome, RateLimiterConfig};
use super::retrier::{Retrier, RetrierConfig, RetryableError};

/// Rate-limit cost of a `place_order` call; every other call-site costs
/// [`DEFAULT_TOKENS`].
pub const PLACE_ORDER_TOKENS: u32 = 2;
pub const DEFAULT_TOKENS: u32 = 1;

#[derive(Debug, Clone, Copy)]
pub struct ResilienceConfig {
    pub rate_limiter: RateLimiterConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub retrier: RetrierConfig,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            rate_limiter: RateLimiterConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            retrier: RetrierConfig::default(),
        }
    }
}

fn classify(err: &ExchangeError) -> RetryableError {
    if err.is_transient() {
        RetryableError::ConnectionReset
    } else {
        RetryableError::Other
    }
}

/// Wraps one `ExchangeClient` (or one logical connection to an exchange)
/// with rate limiting, a circuit breaker, and retry-with-backoff.
pub struct Resilience {
    limiter: AdaptiveRateLimiter,
    breaker: CircuitBreaker,
    retrier: Retrier,
}

impl Resilience {
    #[must_use]
    pub fn new(config: ResilienceConfig) -> Self {
        Self {
            limiter: AdaptiveRateLimiter::new(config.rate_limiter),
            breaker: CircuitBreaker::new(config.circuit_breaker),
            retrier: Retrier::new(config.retrier),
        }
    }

    #[must_use]
    pub fn limiter(&self) -> &AdaptiveRateLimiter {
        &self.limiter
    }

    #[must_use]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Runs `f` through `breaker.can_call()` -> `limiter.acquire(tokens)` ->
    /// the call -> retry loop. Every attempt records its outcome into both
    /// the breaker and the limiter before deciding whether to retry.
    pub async fn call<T, F, Fut>(&self, tokens: u32, mut f: F) -> Result<T, ExchangeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ExchangeError>>,
    {
        let max_attempts = self.retrier.max_attempts().max(1);
        let mut last_err = ExchangeError::Transient("resilience: no attempts made".to_string());

        for attempt in 0..max_attempts {
            if let Err(open) = self.breaker.can_call() {
                return Err(ExchangeError::Transient(open.to_string()));
            }

            self.limiter.acquire(tokens).await;

            match f().await {
                Ok(value) => {
                    self.breaker.record_success();
                    self.limiter.on_result(CallOutcome::Success);
                    return Ok(value);
                }
                Err(err) => {
                    self.breaker.record_failure();
                    self.limiter.on_result(CallOutcome::Error);
                    let retryable = classify(&err);
                    last_err = err;
                    let is_last_attempt = attempt + 1 >= max_attempts;
                    if !retryable.is_retryable() || is_last_attempt {
                        return Err(last_err);
                    }
                    tokio::time::sleep(self.retrier.delay_for_attempt(attempt, None)).await;
                }
            }
        }
        Err(last_err)
    }
}
