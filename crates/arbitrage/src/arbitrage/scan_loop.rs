//! Top-level orchestrator: book refresh, detection, filtering, execution,
//! and notification. The one composition boundary allowed to return
//! `anyhow::Result`.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::time::sleep;

use algo_trade_core::ArbitrageConfig;

use super::book_cache::BookCache;
use super::cooldown_tracker::CooldownTracker;
use super::detector::{
    detect_binary_complement, detect_multi_outcome, DetectorConfig, ExposureContext, OutcomeBook,
};
use super::exchange_client::ExchangeClient;
use super::executor::{execute, ExecutionResult, ExecutorConfig, ExecutionMode, LatencyRingBuffer};
use super::notifier::Notifier;
use super::position_monitor::PositionMonitor;
use super::resilience::{Resilience, ResilienceConfig, DEFAULT_TOKENS};
use super::risk_manager::RiskManager;
use super::trade_store::TradeStore;
use super::types::{Market, Opportunity, Position};

const BALANCE_CHECK_INTERVAL: u64 = 20;
const METRICS_LOG_INTERVAL: u64 = 50;

fn detector_config(config: &ArbitrageConfig) -> DetectorConfig {
    DetectorConfig {
        min_profit: config.min_profit,
        fee_bps: config.effective_fee_bps(),
        slippage_bps: config.slippage_bps,
        min_top_size_usd: config.min_top_size_usd,
        max_spread_bps: config.max_spread_bps,
        use_book_depth_for_detection: config.use_book_depth_for_detection,
        staleness_ms: BookCache::recommended_max_age_ms(
            config.polling_interval_ms as i64,
            2,
        ),
    }
}

fn executor_config(config: &ArbitrageConfig) -> ExecutorConfig {
    ExecutorConfig {
        mode: if config.enable_live_trading {
            ExecutionMode::Live
        } else {
            ExecutionMode::Dry
        },
        enable_live_trading: config.enable_live_trading,
        min_profit: config.min_profit,
        order_timeout_ms: config.order_timeout_ms,
        price_improvement_ticks: config.price_improvement_ticks,
        concurrent_legs: config.concurrent_legs > 1,
        adaptive_timeout_enabled: config.adaptive_timeout_enabled,
        adaptive_timeout_min_ms: config.adaptive_timeout_min_ms,
        adaptive_timeout_max_ms: config.adaptive_timeout_max_ms,
    }
}

/// Wires every component together and drives one iteration at a time.
pub struct ScanLoop {
    markets: Vec<Market>,
    client: Arc<dyn ExchangeClient>,
    resilience: Arc<Resilience>,
    book_cache: BookCache,
    risk: Arc<RiskManager>,
    cooldown: CooldownTracker,
    position_monitor: Arc<PositionMonitor>,
    notifier: Arc<dyn Notifier>,
    trade_store: Arc<dyn TradeStore>,
    config: watch::Receiver<ArbitrageConfig>,
    latency_ring: LatencyRingBuffer,
    iteration: u64,
}

impl ScanLoop {
    #[must_use]
    pub fn new(
        markets: Vec<Market>,
        client: Arc<dyn ExchangeClient>,
        risk: Arc<RiskManager>,
        position_monitor: Arc<PositionMonitor>,
        notifier: Arc<dyn Notifier>,
        trade_store: Arc<dyn TradeStore>,
        config: watch::Receiver<ArbitrageConfig>,
    ) -> Self {
        let initial = config.borrow().clone();
        let total_token_ids: i64 = markets.iter().map(|m| m.token_ids().len() as i64).sum();
        let max_age_ms =
            BookCache::recommended_max_age_ms(initial.polling_interval_ms as i64, total_token_ids);
        Self {
            markets,
            client,
            resilience: Arc::new(Resilience::new(ResilienceConfig::default())),
            book_cache: BookCache::new(max_age_ms),
            risk,
            cooldown: CooldownTracker::new(initial.cooldown_ms as i64),
            position_monitor,
            notifier,
            trade_store,
            config,
            latency_ring: LatencyRingBuffer::new(50),
            iteration: 0,
        }
    }

    /// Runs the scan loop until `shutdown` fires. Returns once shutdown has
    /// been handled cleanly: open orders are best-effort cancelled and final
    /// state is persisted.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        loop {
            tokio::select! {
                () = sleep(std::time::Duration::from_millis(self.current_config().polling_interval_ms)) => {
                    self.run_once().await.context("scan loop iteration failed")?;
                }
                result = shutdown.changed() => {
                    result.context("shutdown channel closed unexpectedly")?;
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        self.shutdown().await
    }

    fn current_config(&self) -> ArbitrageConfig {
        self.config.borrow().clone()
    }

    /// Runs exactly one loop iteration: refresh, detect, filter, execute.
    pub async fn run_once(&mut self) -> anyhow::Result<()> {
        self.iteration += 1;
        let config = self.current_config();

        if self.iteration % BALANCE_CHECK_INTERVAL == 0 {
            let client = self.client.as_ref();
            let balance = self.resilience.call(DEFAULT_TOKENS, || client.get_balance()).await;
            if let Ok(balance) = balance {
                self.risk.update_balance(balance);
            }
        }

        self.refresh_books().await;

        let now_ms = Utc::now().timestamp_millis();
        let books = self.book_cache.get_all(now_ms);

        let det_config = detector_config(&config);
        let mut opportunities = Vec::new();
        for market in &self.markets {
            let exposure = ExposureContext {
                per_market_max_usd: config.per_market_max_usd,
                remaining_global_exposure_usd: (config.max_exposure_usd
                    - self.risk.global_exposure_usd())
                .max(Decimal::ZERO),
                bankroll_usd: config.bankroll_usd,
                kelly_fraction: config.kelly_fraction,
            };
            match market {
                Market::Binary {
                    name,
                    yes_token_id,
                    no_token_id,
                } => {
                    let (Some(yes_book), Some(no_book)) =
                        (books.get(yes_token_id), books.get(no_token_id))
                    else {
                        continue;
                    };
                    if let Some(opp) = detect_binary_complement(
                        name,
                        yes_token_id,
                        no_token_id,
                        yes_book,
                        no_book,
                        &det_config,
                        &exposure,
                        now_ms,
                    ) {
                        opportunities.push(opp);
                    }
                }
                Market::Multi { name, outcomes } => {
                    let Some(outcome_books): Option<Vec<OutcomeBook<'_>>> = outcomes
                        .iter()
                        .map(|o| {
                            books.get(&o.token_id).map(|book| OutcomeBook {
                                label: &o.label,
                                token_id: &o.token_id,
                                book,
                            })
                        })
                        .collect()
                    else {
                        continue;
                    };
                    if let Some(opp) = detect_multi_outcome(
                        name,
                        &outcome_books,
                        &det_config,
                        &exposure,
                        now_ms,
                    ) {
                        opportunities.push(opp);
                    }
                }
            }
        }

        let min_profit_bps = config.min_profit * Decimal::from(10_000);
        opportunities.retain(|opp| {
            opp.expected_profit_bps() >= min_profit_bps && !self.cooldown.is_suppressed(opp, now_ms)
        });

        opportunities.sort_by(|a, b| b.expected_profit_bps().cmp(&a.expected_profit_bps()));

        if let Some(opp) = opportunities.into_iter().next() {
            self.execute_best(&opp, &books, &config).await;
        }

        if self.iteration % METRICS_LOG_INTERVAL == 0 {
            self.cooldown.prune(now_ms);
            tracing::info!(iteration = self.iteration, "scan loop metrics checkpoint");
        }

        Ok(())
    }

    async fn refresh_books(&self) {
        let client = self.client.as_ref();
        for token_id in self.markets.iter().flat_map(Market::token_ids) {
            let book = self
                .resilience
                .call(DEFAULT_TOKENS, || client.get_order_book(token_id))
                .await;
            if let Ok(book) = book {
                self.book_cache.set(book);
            }
        }
    }

    async fn execute_best(
        &mut self,
        opp: &Opportunity,
        books: &HashMap<String, super::types::OrderBook>,
        config: &ArbitrageConfig,
    ) {
        let result = execute(
            opp,
            books,
            self.client.as_ref(),
            self.resilience.as_ref(),
            self.risk.as_ref(),
            &executor_config(config),
            &mut self.latency_ring,
        )
        .await;

        let now_ms = Utc::now().timestamp_millis();
        self.cooldown.record(opp, now_ms);
        self.risk.activate_market_cooldown(opp.market_name());
        self.risk.activate_cooldown();

        let _ = self.trade_store.insert_trade(opp).await;

        match result {
            ExecutionResult::Success { filled_legs } => {
                for leg in filled_legs {
                    self.position_monitor.track(Position::new(
                        opp.trade_id(),
                        opp.market_name(),
                        leg.token_id,
                        leg.price,
                        leg.filled_size,
                        Utc::now(),
                    ));
                }
                self.notifier.notify_executed(opp).await;
            }
            ExecutionResult::SyntheticSuccess => {
                self.notifier.notify_executed(opp).await;
            }
            ExecutionResult::Refused { reason } => {
                self.notifier.notify_refused(opp.market_name(), &reason).await;
            }
            ExecutionResult::Failed {
                hedged,
                loss_usd,
                error,
            } => {
                if hedged && loss_usd > Decimal::ZERO {
                    self.risk.record_loss(loss_usd);
                }
                self.notifier.notify_refused(opp.market_name(), &error).await;
            }
        }
    }

    /// Best-effort shutdown: cancels any resting orders and persists a final
    /// config snapshot. Errors here are logged, not propagated — a failed
    /// cleanup step must not prevent process exit.
    async fn shutdown(&self) -> anyhow::Result<()> {
        let client = self.client.as_ref();
        let cancelled = self
            .resilience
            .call(DEFAULT_TOKENS, || client.cancel_all_open_orders())
            .await;
        if let Err(e) = cancelled {
            tracing::error!(error = %e, "failed to cancel open orders during shutdown");
        }
        let snapshot = serde_json::to_string(&self.current_config()).unwrap_or_default();
        if let Err(e) = self.trade_store.save_config_snapshot(&snapshot).await {
            tracing::error!(error = %e, "failed to persist config snapshot during shutdown");
        }
        Ok(())
    }
}
