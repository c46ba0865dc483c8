//! Process-wide configuration for the arbitrage engine.
//!
//! Mirrors the flat, preset-driven shape of `ExecutorConfig` in the reference
//! workspace: one `Serialize + Deserialize` struct with a conservative baseline
//! `Default` plus named presets, loaded by [`crate::config_loader::ConfigLoader`]
//! and hot-reloaded by [`crate::config_watcher::ConfigWatcher`].

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArbitrageConfig {
    /// Milliseconds between scan loop iterations.
    pub polling_interval_ms: u64,
    /// Minimum acceptable expected profit, as a fraction of notional (e.g. 0.01 = 1%).
    pub min_profit: Decimal,
    /// Default taker fee in basis points, used when `taker_fee_bps` is absent.
    pub fee_bps: Decimal,
    /// Exchange-reported taker fee in basis points; preferred over `fee_bps` when present.
    pub taker_fee_bps: Option<Decimal>,
    /// Slippage allowance in basis points applied on top of fees.
    pub slippage_bps: Decimal,
    /// Maximum process-wide notional exposure, in quote currency.
    pub max_exposure_usd: Decimal,
    /// Maximum notional exposure for any single market.
    pub per_market_max_usd: Decimal,
    /// Daily realised-loss stop, in quote currency.
    pub daily_stop_loss_usd: Decimal,
    /// Maximum number of simultaneously open orders.
    pub max_open_orders: u32,
    /// Per-leg order fill timeout, in milliseconds.
    pub order_timeout_ms: u64,
    /// Global post-trade cooldown, in milliseconds.
    pub cooldown_ms: u64,
    /// Per-market post-trade cooldown, in milliseconds.
    pub per_market_cooldown_ms: u64,
    /// Per-opportunity (token-id set) re-entry cooldown, in milliseconds.
    pub opp_cooldown_ms: u64,
    /// Minimum top-of-book notional required on every leg, in quote currency.
    pub min_top_size_usd: Decimal,
    /// Ticks of price improvement requested beyond the observed best price.
    pub price_improvement_ticks: u32,
    /// Optional maximum bid/ask spread per leg, in basis points. `None` disables the filter.
    pub max_spread_bps: Option<u32>,
    /// Whether detectors should walk full book depth (VWAP) instead of top-of-book only.
    pub use_book_depth_for_detection: bool,
    /// Bankroll used for Kelly sizing.
    pub bankroll_usd: Decimal,
    /// Fraction of full Kelly to size with (e.g. 0.25 = quarter-Kelly).
    pub kelly_fraction: Decimal,
    /// Number of legs to place concurrently instead of sequentially (1 = sequential).
    pub concurrent_legs: u32,
    /// Enables the p75-latency adaptive fill timeout.
    pub adaptive_timeout_enabled: bool,
    /// Floor for the adaptive timeout, in milliseconds.
    pub adaptive_timeout_min_ms: u64,
    /// Ceiling for the adaptive timeout, in milliseconds.
    pub adaptive_timeout_max_ms: u64,
    /// Maximum age of an open position before a forced exit, in milliseconds.
    pub position_max_age_ms: u64,
    /// Trailing-stop distance from the position high-water mark, in basis points.
    pub trailing_stop_bps: u32,
    /// Consecutive execution errors before safe-mode engages.
    pub safe_mode_error_threshold: u32,
    /// Master switch: when false, the executor never submits real orders.
    pub enable_live_trading: bool,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            polling_interval_ms: 2_000,
            min_profit: dec!(0.01),
            fee_bps: dec!(0),
            taker_fee_bps: None,
            slippage_bps: dec!(0),
            max_exposure_usd: dec!(2000),
            per_market_max_usd: dec!(500),
            daily_stop_loss_usd: dec!(50),
            max_open_orders: 10,
            order_timeout_ms: 3_000,
            cooldown_ms: 5_000,
            per_market_cooldown_ms: 10_000,
            opp_cooldown_ms: 15_000,
            min_top_size_usd: dec!(25),
            price_improvement_ticks: 0,
            max_spread_bps: None,
            use_book_depth_for_detection: false,
            bankroll_usd: dec!(1000),
            kelly_fraction: dec!(0.25),
            concurrent_legs: 1,
            adaptive_timeout_enabled: true,
            adaptive_timeout_min_ms: 500,
            adaptive_timeout_max_ms: 10_000,
            position_max_age_ms: 60 * 60 * 1_000,
            trailing_stop_bps: 200,
            safe_mode_error_threshold: 3,
            enable_live_trading: false,
        }
    }
}

impl ArbitrageConfig {
    /// Tighter limits for initial validation runs against real money.
    #[must_use]
    pub fn conservative() -> Self {
        Self {
            min_profit: dec!(0.02),
            max_exposure_usd: dec!(500),
            per_market_max_usd: dec!(200),
            daily_stop_loss_usd: dec!(25),
            max_open_orders: 4,
            min_top_size_usd: dec!(50),
            kelly_fraction: dec!(0.1),
            concurrent_legs: 1,
            safe_mode_error_threshold: 2,
            ..Self::default()
        }
    }

    /// Looser limits for a well-understood, liquid market.
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            min_profit: dec!(0.005),
            max_exposure_usd: dec!(5000),
            per_market_max_usd: dec!(1500),
            daily_stop_loss_usd: dec!(150),
            max_open_orders: 20,
            min_top_size_usd: dec!(10),
            kelly_fraction: dec!(0.5),
            concurrent_legs: 4,
            safe_mode_error_threshold: 5,
            ..Self::default()
        }
    }

    /// Effective taker fee: `taker_fee_bps` when present, else `fee_bps`.
    #[must_use]
    pub fn effective_fee_bps(&self) -> Decimal {
        self.taker_fee_bps.unwrap_or(self.fee_bps)
    }

    #[must_use]
    pub fn with_min_profit(mut self, min_profit: Decimal) -> Self {
        self.min_profit = min_profit;
        self
    }

    #[must_use]
    pub fn with_bankroll_usd(mut self, bankroll_usd: Decimal) -> Self {
        self.bankroll_usd = bankroll_usd;
        self
    }

    #[must_use]
    pub fn with_enable_live_trading(mut self, enable: bool) -> Self {
        self.enable_live_trading = enable;
        self
    }
}
