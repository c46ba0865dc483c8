//! Pre-trade risk gate: exposure caps, daily stop-loss, cooldowns, and the
//! consecutive-error safe-mode kill switch.

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct RiskManagerConfig {
    pub max_exposure_usd: Decimal,
    pub per_market_max_usd: Decimal,
    pub daily_stop_loss_usd: Decimal,
    pub max_open_orders: u32,
    pub cooldown: Duration,
    pub per_market_cooldown: Duration,
    pub safe_mode_error_threshold: u32,
    pub min_balance_usd: Decimal,
}

impl Default for RiskManagerConfig {
    fn default() -> Self {
        Self {
            max_exposure_usd: Decimal::from(500),
            per_market_max_usd: Decimal::from(100),
            daily_stop_loss_usd: Decimal::from(50),
            max_open_orders: 10,
            cooldown: Duration::from_millis(500),
            per_market_cooldown: Duration::from_secs(5),
            safe_mode_error_threshold: 3,
            min_balance_usd: Decimal::from(20),
        }
    }
}

impl RiskManagerConfig {
    #[must_use]
    pub fn conservative() -> Self {
        Self {
            max_exposure_usd: Decimal::from(200),
            per_market_max_usd: Decimal::from(50),
            daily_stop_loss_usd: Decimal::from(25),
            max_open_orders: 5,
            cooldown: Duration::from_secs(1),
            per_market_cooldown: Duration::from_secs(10),
            safe_mode_error_threshold: 2,
            min_balance_usd: Decimal::from(50),
        }
    }
}

/// Why a trade was refused. Exactly one reason is ever reported, the first
/// gate (in the fixed check order) that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskRefusal {
    KillSwitchTripped,
    SafeMode,
    GlobalCooldown,
    MarketCooldown { market_name: String },
    DailyStopLossHit,
    BelowMinBalance,
    InsufficientBalance,
    GlobalExposureExceeded,
    MarketExposureExceeded { market_name: String },
    TooManyOpenOrders,
}

struct Inner {
    global_exposure_usd: Decimal,
    market_exposure_usd: HashMap<String, Decimal>,
    open_orders: u32,
    daily_pnl_usd: Decimal,
    daily_date: NaiveDate,
    consecutive_errors: u32,
    safe_mode: bool,
    kill_switch: bool,
    last_trade_at: Option<Instant>,
    market_cooldowns: HashMap<String, Instant>,
    balance_usd: Decimal,
}

impl Inner {
    fn new(starting_balance: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            global_exposure_usd: Decimal::ZERO,
            market_exposure_usd: HashMap::new(),
            open_orders: 0,
            daily_pnl_usd: Decimal::ZERO,
            daily_date: now.date_naive(),
            consecutive_errors: 0,
            safe_mode: false,
            kill_switch: false,
            last_trade_at: None,
            market_cooldowns: HashMap::new(),
            balance_usd: starting_balance,
        }
    }

    fn roll_day_if_needed(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if today != self.daily_date {
            self.daily_date = today;
            self.daily_pnl_usd = Decimal::ZERO;
        }
    }
}

/// Gates every prospective order. Checks run in a fixed order; the first
/// failing gate is the reported refusal reason.
pub struct RiskManager {
    config: RiskManagerConfig,
    state: RwLock<Inner>,
}

impl RiskManager {
    #[must_use]
    pub fn new(config: RiskManagerConfig, starting_balance_usd: Decimal) -> Self {
        Self {
            state: RwLock::new(Inner::new(starting_balance_usd, Utc::now())),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RiskManagerConfig {
        &self.config
    }

    /// Checks whether a prospective trade may proceed. `now` is passed in so
    /// cooldown and day-roll logic stays deterministic and testable.
    ///
    /// # Errors
    /// Returns the first [`RiskRefusal`] gate that fails, in this order:
    /// kill switch, safe mode, global cooldown, per-market cooldown, daily
    /// stop-loss, minimum balance floor, sufficient balance, global exposure
    /// cap, per-market exposure cap, max open orders.
    pub fn can_trade(
        &self,
        market_name: &str,
        estimated_exposure_usd: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), RiskRefusal> {
        let mut state = self.state.write();
        state.roll_day_if_needed(now);

        if state.kill_switch {
            return Err(RiskRefusal::KillSwitchTripped);
        }
        if state.safe_mode {
            return Err(RiskRefusal::SafeMode);
        }
        let monotonic_now = Instant::now();
        if let Some(last) = state.last_trade_at {
            if monotonic_now.duration_since(last) < self.config.cooldown {
                return Err(RiskRefusal::GlobalCooldown);
            }
        }
        if let Some(last) = state.market_cooldowns.get(market_name) {
            if monotonic_now.duration_since(*last) < self.config.per_market_cooldown {
                return Err(RiskRefusal::MarketCooldown {
                    market_name: market_name.to_string(),
                });
            }
        }
        if -state.daily_pnl_usd >= self.config.daily_stop_loss_usd {
            return Err(RiskRefusal::DailyStopLossHit);
        }
        if state.balance_usd < self.config.min_balance_usd {
            return Err(RiskRefusal::BelowMinBalance);
        }
        if state.balance_usd < estimated_exposure_usd {
            return Err(RiskRefusal::InsufficientBalance);
        }
        if state.global_exposure_usd + estimated_exposure_usd > self.config.max_exposure_usd {
            return Err(RiskRefusal::GlobalExposureExceeded);
        }
        let market_exposure = state
            .market_exposure_usd
            .get(market_name)
            .copied()
            .unwrap_or(Decimal::ZERO);
        if market_exposure + estimated_exposure_usd > self.config.per_market_max_usd {
            return Err(RiskRefusal::MarketExposureExceeded {
                market_name: market_name.to_string(),
            });
        }
        if state.open_orders >= self.config.max_open_orders {
            return Err(RiskRefusal::TooManyOpenOrders);
        }
        Ok(())
    }

    /// Adjusts both global and per-market exposure by `delta_usd` (negative
    /// on a position exit releasing notional). Clamped at zero so a release
    /// can never drive exposure negative.
    pub fn update_exposure(&self, market_name: &str, delta_usd: Decimal) {
        let mut state = self.state.write();
        state.global_exposure_usd = (state.global_exposure_usd + delta_usd).max(Decimal::ZERO);
        let market_exposure = state
            .market_exposure_usd
            .entry(market_name.to_string())
            .or_insert(Decimal::ZERO);
        *market_exposure = (*market_exposure + delta_usd).max(Decimal::ZERO);
    }

    pub fn record_order_placed(&self) {
        self.state.write().open_orders += 1;
    }

    pub fn record_order_closed(&self) {
        let mut state = self.state.write();
        state.open_orders = state.open_orders.saturating_sub(1);
    }

    pub fn activate_cooldown(&self) {
        self.state.write().last_trade_at = Some(Instant::now());
    }

    pub fn activate_market_cooldown(&self, market_name: &str) {
        self.state
            .write()
            .market_cooldowns
            .insert(market_name.to_string(), Instant::now());
    }

    pub fn reset_daily(&self) {
        let mut state = self.state.write();
        state.daily_pnl_usd = Decimal::ZERO;
        state.daily_date = Utc::now().date_naive();
    }

    pub fn record_loss(&self, loss_usd: Decimal) {
        self.state.write().daily_pnl_usd -= loss_usd;
    }

    pub fn record_profit(&self, profit_usd: Decimal) {
        self.state.write().daily_pnl_usd += profit_usd;
    }

    /// Records an execution error. Trips safe mode once
    /// `safe_mode_error_threshold` consecutive errors accumulate.
    pub fn record_error(&self) {
        let mut state = self.state.write();
        state.consecutive_errors += 1;
        if state.consecutive_errors >= self.config.safe_mode_error_threshold {
            state.safe_mode = true;
        }
    }

    pub fn record_success(&self) {
        self.state.write().consecutive_errors = 0;
    }

    pub fn clear_safe_mode(&self) {
        let mut state = self.state.write();
        state.safe_mode = false;
        state.consecutive_errors = 0;
    }

    pub fn trip_kill_switch(&self) {
        self.state.write().kill_switch = true;
    }

    pub fn reset_kill_switch(&self) {
        self.state.write().kill_switch = false;
    }

    pub fn update_balance(&self, balance_usd: Decimal) {
        self.state.write().balance_usd = balance_usd;
    }

    #[must_use]
    pub fn is_safe_mode(&self) -> bool {
        self.state.read().safe_mode
    }

    #[must_use]
    pub fn is_kill_switch_tripped(&self) -> bool {
        self.state.read().kill_switch
    }

    #[must_use]
    pub fn daily_pnl_usd(&self) -> Decimal {
        self.state.read().daily_pnl_usd
    }

    #[must_use]
    pub fn global_exposure_usd(&self) -> Decimal {
        self.state.read().global_exposure_usd
    }
}
