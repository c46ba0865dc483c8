//! Transport-level circuit breaker for exchange calls.
//!
//! Three states: `closed -> open -> half-open -> closed`. Closed counts
//! consecutive failures; crossing `failure_threshold` opens the breaker. Open
//! refuses every call until `reset_timeout` elapses, then moves to half-open
//! and allows probe calls through; `success_threshold` consecutive probe
//! successes close it again, while any half-open failure re-opens it.
//!
//! # Example
//!
//! ```
//! use algo_trade_arbitrage::arbitrage::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
//!
//! let breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
//! assert!(breaker.can_call().is_ok());
//! breaker.record_success();
//! ```

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures (while closed) that open the breaker.
    pub failure_threshold: u32,
    /// Time the breaker stays open before allowing a half-open probe.
    #[serde(with = "millis_serde")]
    pub reset_timeout: Duration,
    /// Consecutive probe successes (while half-open) that close the breaker.
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

impl CircuitBreakerConfig {
    /// Tighter limits: opens faster, waits longer, demands more proof to close.
    #[must_use]
    pub fn conservative() -> Self {
        Self {
            failure_threshold: 3,
            reset_timeout: Duration::from_secs(60),
            success_threshold: 3,
        }
    }

    #[must_use]
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold;
        self
    }
}

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct Inner {
    state: State,
    consecutive_failures: u32,
    consecutive_probe_successes: u32,
    opened_at: Option<Instant>,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: State::Closed,
            consecutive_failures: 0,
            consecutive_probe_successes: 0,
            opened_at: None,
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CircuitBreakerError {
    #[error("circuit open, {remaining_secs}s remaining before half-open probe")]
    Open { remaining_secs: u64 },
}

// =============================================================================
// CircuitBreaker
// =============================================================================

pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: RwLock<Inner>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("state", &state.state)
            .field("consecutive_failures", &state.consecutive_failures)
            .finish()
    }
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: RwLock::new(Inner::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Checks whether a call may proceed, transitioning `open -> half-open`
    /// as a side effect once `reset_timeout` has elapsed.
    ///
    /// # Errors
    /// Returns [`CircuitBreakerError::Open`] while the breaker is open and
    /// the reset timeout has not yet elapsed.
    pub fn can_call(&self) -> Result<(), CircuitBreakerError> {
        let mut state = self.state.write();
        match state.state {
            State::Closed | State::HalfOpen => Ok(()),
            State::Open => {
                let opened_at = state.opened_at.expect("open state always has opened_at");
                let elapsed = opened_at.elapsed();
                if elapsed >= self.config.reset_timeout {
                    state.state = State::HalfOpen;
                    state.consecutive_probe_successes = 0;
                    Ok(())
                } else {
                    let remaining = self.config.reset_timeout - elapsed;
                    Err(CircuitBreakerError::Open {
                        remaining_secs: remaining.as_secs(),
                    })
                }
            }
        }
    }

    /// Records a successful call. In half-open, counts towards `success_threshold`
    /// before closing; in closed, resets the failure counter.
    pub fn record_success(&self) {
        let mut state = self.state.write();
        match state.state {
            State::Closed => {
                state.consecutive_failures = 0;
            }
            State::HalfOpen => {
                state.consecutive_probe_successes += 1;
                if state.consecutive_probe_successes >= self.config.success_threshold {
                    state.state = State::Closed;
                    state.consecutive_failures = 0;
                    state.consecutive_probe_successes = 0;
                    state.opened_at = None;
                }
            }
            State::Open => {}
        }
    }

    /// Records a failed call. Opens the breaker once `failure_threshold` is
    /// crossed while closed; any half-open failure re-opens immediately.
    pub fn record_failure(&self) {
        let mut state = self.state.write();
        match state.state {
            State::Closed => {
                state.consecutive_failures += 1;
                if state.consecutive_failures >= self.config.failure_threshold {
                    state.state = State::Open;
                    state.opened_at = Some(Instant::now());
                }
            }
            State::HalfOpen => {
                state.state = State::Open;
                state.opened_at = Some(Instant::now());
                state.consecutive_probe_successes = 0;
            }
            State::Open => {}
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.state.read().state, State::Open)
    }

    #[must_use]
    pub fn is_half_open(&self) -> bool {
        matches!(self.state.read().state, State::HalfOpen)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self.state.read().state, State::Closed)
    }

    pub fn reset(&self) {
        *self.state.write() = Inner::new();
    }
}

// =============================================================================
// Serde support for Duration (milliseconds)
// =============================================================================

mod millis_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// =============================================================================
// Tests
// =============================================================================
