//! Turns a detected [`Opportunity`] into filled legs, with adaptive timeouts,
//! partial-fill acceptance, and hedge-on-failure.

use std::collections::HashMap;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;
use tokio::time::{sleep, Instant};

use super::exchange_client::ExchangeClient;
use super::hedger::hedge;
use super::price_math::{adjust_by_ticks, round_up};
use super::resilience::{Resilience, DEFAULT_TOKENS, PLACE_ORDER_TOKENS};
use super::risk_manager::RiskManager;
use super::types::{Opportunity, OrderBook, OrderStatus, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Live,
    Dry,
}

#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    pub mode: ExecutionMode,
    pub enable_live_trading: bool,
    pub min_profit: Decimal,
    pub order_timeout_ms: u64,
    pub price_improvement_ticks: u32,
    pub concurrent_legs: bool,
    pub adaptive_timeout_enabled: bool,
    pub adaptive_timeout_min_ms: u64,
    pub adaptive_timeout_max_ms: u64,
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("refused: {0}")]
    Refused(String),
}

/// One filled (or partially accepted) leg.
#[derive(Debug, Clone)]
pub struct FilledLeg {
    pub token_id: String,
    pub price: Decimal,
    pub requested_size: Decimal,
    pub filled_size: Decimal,
}

#[derive(Debug, Clone)]
pub enum ExecutionResult {
    Refused {
        reason: String,
    },
    /// Dry-run or safe-mode synthetic success: no orders were actually placed.
    SyntheticSuccess,
    Success {
        filled_legs: Vec<FilledLeg>,
    },
    Failed {
        hedged: bool,
        loss_usd: Decimal,
        error: String,
    },
}

/// Tracks the last 50 fill latencies to derive an adaptive poll timeout.
pub struct LatencyRingBuffer {
    samples: Vec<Duration>,
    capacity: usize,
}

impl LatencyRingBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, latency: Duration) {
        if self.samples.len() == self.capacity {
            self.samples.remove(0);
        }
        self.samples.push(latency);
    }

    /// p75 of recorded samples, or `None` before 3 samples exist.
    #[must_use]
    pub fn p75(&self) -> Option<Duration> {
        if self.samples.len() < 3 {
            return None;
        }
        let mut sorted = self.samples.clone();
        sorted.sort();
        let idx = ((sorted.len() as f64) * 0.75).floor() as usize;
        Some(sorted[idx.min(sorted.len() - 1)])
    }
}

fn adaptive_timeout(config: &ExecutorConfig, ring: &LatencyRingBuffer) -> Duration {
    if !config.adaptive_timeout_enabled {
        return Duration::from_millis(config.order_timeout_ms);
    }
    match ring.p75() {
        Some(p75) => {
            let doubled_ms = (p75.as_millis() as u64).saturating_mul(2);
            Duration::from_millis(
                doubled_ms
                    .max(config.adaptive_timeout_min_ms)
                    .min(config.adaptive_timeout_max_ms),
            )
        }
        None => Duration::from_millis(config.order_timeout_ms),
    }
}

fn order_price(ask_price: Decimal, improvement_ticks: u32) -> Decimal {
    round_up(adjust_by_ticks(ask_price, i64::from(improvement_ticks)))
}

/// Polls `get_order_status` until filled, accepted-partial (>= 50% filled),
/// or `timeout` elapses.
async fn poll_until_settled(
    client: &dyn ExchangeClient,
    resilience: &Resilience,
    order_id: &str,
    requested_size: Decimal,
    timeout: Duration,
) -> Option<Decimal> {
    let poll_interval = Duration::from_millis(150).min(timeout / 10);
    let deadline = Instant::now() + timeout;
    loop {
        let status = resilience
            .call(DEFAULT_TOKENS, || client.get_order_status(order_id))
            .await;
        if let Ok(Some(order)) = status {
            match order.status {
                OrderStatus::Filled => return Some(order.filled_size),
                OrderStatus::Partial if order.filled_size / requested_size >= Decimal::new(5, 1) => {
                    return Some(order.filled_size);
                }
                OrderStatus::Cancelled | OrderStatus::Expired => return None,
                _ => {}
            }
        }
        if Instant::now() >= deadline {
            return None;
        }
        sleep(poll_interval).await;
    }
}

async fn revalidate_profitable(
    client: &dyn ExchangeClient,
    resilience: &Resilience,
    opp: &Opportunity,
    min_profit: Decimal,
) -> bool {
    let legs = opp.legs();
    let mut fresh_asks = Vec::with_capacity(legs.len());
    for (token_id, _, _) in &legs {
        match resilience
            .call(DEFAULT_TOKENS, || client.get_order_book(token_id))
            .await
        {
            Ok(book) => match book.best_ask() {
                Some(ask) => fresh_asks.push(ask),
                None => return false,
            },
            Err(_) => return false,
        }
    }
    let total: Decimal = fresh_asks.iter().copied().sum();
    Decimal::ONE - total >= min_profit
}

/// Executes one detected opportunity end to end.
pub async fn execute(
    opp: &Opportunity,
    _books: &HashMap<String, OrderBook>,
    client: &dyn ExchangeClient,
    resilience: &Resilience,
    risk: &RiskManager,
    config: &ExecutorConfig,
    latency_ring: &mut LatencyRingBuffer,
) -> ExecutionResult {
    let estimated_exposure = opp.all_in_cost() * opp.target_size_shares();
    if let Err(refusal) = risk.can_trade(opp.market_name(), estimated_exposure, chrono::Utc::now()) {
        return ExecutionResult::Refused {
            reason: format!("{refusal:?}"),
        };
    }

    if config.mode == ExecutionMode::Live && !config.enable_live_trading {
        return ExecutionResult::Refused {
            reason: "live trading disabled".to_string(),
        };
    }

    if config.mode == ExecutionMode::Dry || risk.is_safe_mode() {
        return ExecutionResult::SyntheticSuccess;
    }

    if !revalidate_profitable(client, resilience, opp, config.min_profit).await {
        return ExecutionResult::Refused {
            reason: "stale opportunity".to_string(),
        };
    }

    let legs = opp.legs();
    let timeout = adaptive_timeout(config, latency_ring);

    let result = if config.concurrent_legs && legs.len() >= 2 {
        execute_concurrent(client, resilience, &legs, config, timeout, latency_ring).await
    } else {
        execute_sequential(client, resilience, &legs, config, timeout, latency_ring, risk).await
    };

    match &result {
        ExecutionResult::Success { filled_legs } => {
            let mut total_exposure = Decimal::ZERO;
            for leg in filled_legs {
                total_exposure += leg.price * leg.filled_size;
            }
            risk.update_exposure(opp.market_name(), total_exposure);
            risk.record_order_placed();
            risk.record_success();
        }
        ExecutionResult::Failed { .. } => {}
        _ => {}
    }

    result
}

async fn execute_sequential(
    client: &dyn ExchangeClient,
    resilience: &Resilience,
    legs: &[(String, Decimal, Decimal)],
    config: &ExecutorConfig,
    timeout: Duration,
    latency_ring: &mut LatencyRingBuffer,
    risk: &RiskManager,
) -> ExecutionResult {
    let mut filled_legs = Vec::with_capacity(legs.len());
    for (token_id, ask_price, size) in legs {
        let price = order_price(*ask_price, config.price_improvement_ticks);
        let started = Instant::now();
        let placed = resilience
            .call(PLACE_ORDER_TOKENS, || {
                client.place_order(token_id, Side::Buy, price, *size)
            })
            .await;
        let order = match placed {
            Ok(order) => order,
            Err(_) => {
                risk.record_error();
                let hedge_outcome = hedge_all(client, resilience, &filled_legs).await;
                return ExecutionResult::Failed {
                    hedged: hedge_outcome.0,
                    loss_usd: hedge_outcome.1,
                    error: "leg placement failed".to_string(),
                };
            }
        };

        match poll_until_settled(client, resilience, &order.id, *size, timeout).await {
            Some(filled_size) => {
                latency_ring.record(started.elapsed());
                filled_legs.push(FilledLeg {
                    token_id: token_id.clone(),
                    price,
                    requested_size: *size,
                    filled_size,
                });
            }
            None => {
                let _ = resilience
                    .call(DEFAULT_TOKENS, || client.cancel_order(&order.id))
                    .await;
                let hedge_outcome = hedge_all(client, resilience, &filled_legs).await;
                return ExecutionResult::Failed {
                    hedged: hedge_outcome.0,
                    loss_usd: hedge_outcome.1,
                    error: "leg timeout".to_string(),
                };
            }
        }
    }
    ExecutionResult::Success { filled_legs }
}

async fn execute_concurrent(
    client: &dyn ExchangeClient,
    resilience: &Resilience,
    legs: &[(String, Decimal, Decimal)],
    config: &ExecutorConfig,
    timeout: Duration,
    latency_ring: &mut LatencyRingBuffer,
) -> ExecutionResult {
    let placements = futures_util::future::join_all(legs.iter().map(|(token_id, ask_price, size)| {
        let price = order_price(*ask_price, config.price_improvement_ticks);
        async move {
            let result = resilience
                .call(PLACE_ORDER_TOKENS, || {
                    client.place_order(token_id, Side::Buy, price, *size)
                })
                .await;
            (token_id.clone(), price, *size, result)
        }
    }))
    .await;

    if placements.iter().any(|(_, _, _, r)| r.is_err()) {
        let filled: Vec<FilledLeg> = placements
            .iter()
            .filter_map(|(token_id, price, size, r)| {
                r.as_ref().ok().map(|order| FilledLeg {
                    token_id: token_id.clone(),
                    price: *price,
                    requested_size: *size,
                    filled_size: order.filled_size,
                })
            })
            .collect();
        let hedge_outcome = hedge_all(client, resilience, &filled).await;
        return ExecutionResult::Failed {
            hedged: hedge_outcome.0,
            loss_usd: hedge_outcome.1,
            error: "leg placement failed".to_string(),
        };
    }

    let started = Instant::now();
    let polls = futures_util::future::join_all(placements.iter().map(|(token_id, price, size, r)| {
        let order = r.as_ref().expect("checked above").clone();
        async move {
            let filled = poll_until_settled(client, resilience, &order.id, *size, timeout).await;
            (token_id.clone(), *price, *size, order.id.clone(), filled)
        }
    }))
    .await;

    if polls.iter().any(|(_, _, _, _, filled)| filled.is_none()) {
        let filled_legs: Vec<FilledLeg> = polls
            .iter()
            .filter_map(|(token_id, price, size, _, filled)| {
                filled.map(|f| FilledLeg {
                    token_id: token_id.clone(),
                    price: *price,
                    requested_size: *size,
                    filled_size: f,
                })
            })
            .collect();
        for (_, _, _, order_id, filled) in &polls {
            if filled.is_none() {
                let _ = resilience
                    .call(DEFAULT_TOKENS, || client.cancel_order(order_id))
                    .await;
            }
        }
        let hedge_outcome = hedge_all(client, resilience, &filled_legs).await;
        return ExecutionResult::Failed {
            hedged: hedge_outcome.0,
            loss_usd: hedge_outcome.1,
            error: "leg timeout".to_string(),
        };
    }

    latency_ring.record(started.elapsed());
    let filled_legs = polls
        .into_iter()
        .map(|(token_id, price, size, _, filled)| FilledLeg {
            token_id,
            price,
            requested_size: size,
            filled_size: filled.expect("checked above"),
        })
        .collect();
    ExecutionResult::Success { filled_legs }
}

/// Hedges every filled leg against the exchange's current book, summing loss.
async fn hedge_all(
    client: &dyn ExchangeClient,
    resilience: &Resilience,
    filled_legs: &[FilledLeg],
) -> (bool, Decimal) {
    let mut all_hedged = !filled_legs.is_empty();
    let mut total_loss = Decimal::ZERO;
    for leg in filled_legs {
        let book_result = resilience
            .call(DEFAULT_TOKENS, || client.get_order_book(&leg.token_id))
            .await;
        let Ok(book) = book_result else {
            all_hedged = false;
            continue;
        };
        let result = hedge(client, resilience, &leg.token_id, leg.filled_size, leg.price, &book).await;
        if !result.success {
            all_hedged = false;
        }
        total_loss += result.loss_usd;
    }
    (all_hedged, total_loss)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_ring_reports_none_before_three_samples() {
        let mut ring = LatencyRingBuffer::new(50);
        ring.record(Duration::from_millis(100));
        ring.record(Duration::from_millis(200));
        assert!(ring.p75().is_none());
    }

    #[test]
    fn latency_ring_computes_p75() {
        let mut ring = LatencyRingBuffer::new(50);
        for ms in [100, 200, 300, 400] {
            ring.record(Duration::from_millis(ms));
        }
        assert!(ring.p75().is_some());
    }

    #[test]
    fn latency_ring_evicts_oldest_past_capacity() {
        let mut ring = LatencyRingBuffer::new(3);
        ring.record(Duration::from_millis(1));
        ring.record(Duration::from_millis(2));
        ring.record(Duration::from_millis(3));
        ring.record(Duration::from_millis(4));
        assert_eq!(ring.samples.len(), 3);
        assert_eq!(ring.samples[0], Duration::from_millis(2));
    }

    #[test]
    fn order_price_rounds_up_after_improvement_shift() {
        let price = order_price(Decimal::new(47, 2), 2);
        assert_eq!(price, Decimal::new(49, 2));
    }
}
