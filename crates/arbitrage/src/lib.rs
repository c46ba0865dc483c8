//! Exchange-agnostic prediction-market arbitrage engine.
//!
//! This crate provides:
//! - Detection of binary-complement and N-way outcome-set arbitrage.
//! - Pre-trade risk gating: exposure caps, daily stop-loss, cooldowns, safe mode.
//! - Execution with adaptive timeouts, partial-fill acceptance, and hedging.
//! - Trailing-stop / max-age position monitoring.
//! - A top-level scan loop tying every component together.
//!
//! Concrete exchange transports, notification sinks, and trade persistence
//! are external collaborators; this crate defines the traits they implement.
//!
//! # Example
//!
//! ```no_run
//! use algo_trade_arbitrage::arbitrage::{
//!     CooldownTracker, ExchangeClient, PaperExchangeClient, RiskManager, RiskManagerConfig,
//! };
//! use rust_decimal_macros::dec;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = PaperExchangeClient::new(dec!(1000));
//!     let risk = RiskManager::new(RiskManagerConfig::default(), dec!(1000));
//!     let _cooldowns = CooldownTracker::new(5_000);
//!     let _ = client.get_balance().await;
//!     let _ = risk.is_safe_mode();
//! }
//! ```

pub mod arbitrage;

pub use arbitrage::{
    BookCache, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CooldownTracker,
    ExchangeClient, ExchangeError, ExecutionMode, ExecutionResult, ExecutorConfig, ExecutorError,
    Market, Notifier, NullNotifier, NullTradeStore, Opportunity, Order, OrderBook, OrderStatus,
    OrderType, PaperExchangeClient, Position, PositionMonitor, PositionMonitorConfig,
    RiskManager, RiskManagerConfig, RiskRefusal, ScanLoop, Side, TradeStore,
};
