//! Exchange-agnostic prediction-market arbitrage engine.
//!
//! # Overview
//!
//! In binary prediction markets, arbitrage exists when the combined cost of
//! buying every complementary outcome is less than the guaranteed payout. For
//! a YES/NO pair: if YES asks at $0.47 and NO asks at $0.51, the pair costs
//! $0.98 against a $1.00 payout — a $0.02 riskless edge before fees.
//!
//! # Modules
//!
//! - [`types`]: order books, markets, opportunities, orders, positions.
//! - [`price_math`]: tick rounding.
//! - [`cost_model`] / [`sizer`] / [`orderbook`]: cost breakdown, Kelly-style
//!   sizing, and VWAP book-walking shared by detection and execution.
//! - [`book_cache`]: staleness-gated order book cache.
//! - [`detector`]: binary-complement and N-way outcome-set detection.
//! - [`cooldown_tracker`]: suppresses re-firing the same opportunity.
//! - [`risk_manager`]: pre-trade gating, exposure caps, safe mode.
//! - [`exchange_client`]: the exchange boundary trait plus a paper double.
//! - [`rate_limiter`] / [`circuit_breaker`] / [`retrier`]: transport resilience.
//! - [`resilience`]: the breaker/limiter/retrier chokepoint every call-site uses.
//! - [`executor`]: turns an opportunity into filled legs.
//! - [`hedger`]: unwinds a partially filled position.
//! - [`position_monitor`]: trailing-stop / max-age exits.
//! - [`notifier`] / [`trade_store`]: outbound collaborator boundaries.
//! - [`scan_loop`]: the top-level orchestrator.

pub mod book_cache;
pub mod circuit_breaker;
pub mod cooldown_tracker;
pub mod cost_model;
pub mod detector;
pub mod exchange_client;
pub mod executor;
pub mod hedger;
pub mod notifier;
pub mod orderbook;
pub mod position_monitor;
pub mod price_math;
pub mod rate_limiter;
pub mod resilience;
pub mod retrier;
pub mod risk_manager;
pub mod scan_loop;
pub mod sizer;
pub mod trade_store;
pub mod types;

pub use book_cache::BookCache;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};
pub use cooldown_tracker::CooldownTracker;
pub use cost_model::{compute_cost_breakdown, quick_reject, CostBreakdown};
pub use detector::{
    detect_binary_complement, detect_multi_outcome, DetectorConfig, ExposureContext,
};
pub use exchange_client::{ExchangeClient, ExchangeError, PaperExchangeClient};
pub use executor::{execute, ExecutionMode, ExecutionResult, ExecutorConfig, ExecutorError};
pub use hedger::{hedge, HedgeResult};
pub use notifier::{Notifier, NullNotifier};
pub use orderbook::{depth_at_price, price_impact, simulate_fill, FillSimulation};
pub use position_monitor::{ExitOutcome, ExitReason, PositionMonitor, PositionMonitorConfig};
pub use rate_limiter::{AdaptiveRateLimiter, CallOutcome, RateLimiterConfig};
pub use resilience::{Resilience, ResilienceConfig, DEFAULT_TOKENS, PLACE_ORDER_TOKENS};
pub use retrier::{Retrier, RetrierConfig, RetryableError};
pub use risk_manager::{RiskManager, RiskManagerConfig, RiskRefusal};
pub use scan_loop::ScanLoop;
pub use sizer::{compute_optimal_size, SizingInput};
pub use trade_store::{NullTradeStore, TradeStore};
pub use types::{
    Market, MarketOutcome, Opportunity, OpportunityLeg, Order, OrderBook, OrderBookLevel,
    OrderStatus, OrderType, Position, Side,
};
