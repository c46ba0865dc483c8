//! Periodically revalues tracked positions and exits on a trailing stop or
//! a maximum holding age.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::time::{sleep, Instant};

use super::exchange_client::ExchangeClient;
use super::notifier::Notifier;
use super::price_math::round_down;
use super::resilience::{Resilience, DEFAULT_TOKENS, PLACE_ORDER_TOKENS};
use super::risk_manager::RiskManager;
use super::types::{OrderStatus, Position};

/// How long to wait for an exit sell to settle before giving up and leaving
/// the position tracked for the next sweep.
const EXIT_POLL_TIMEOUT: Duration = Duration::from_millis(2_000);

/// Polls `get_order_status` for an exit order until it fills, accepted-partial
/// (>= 50% filled), or `EXIT_POLL_TIMEOUT` elapses. Mirrors `executor`'s
/// partial-fill acceptance so a position's exit is judged the same way its
/// entry was.
async fn poll_exit_fill(
    client: &dyn ExchangeClient,
    resilience: &Resilience,
    order_id: &str,
    requested_size: Decimal,
) -> Option<Decimal> {
    let poll_interval = Duration::from_millis(150);
    let deadline = Instant::now() + EXIT_POLL_TIMEOUT;
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

#[derive(Debug, Clone, Copy)]
pub struct PositionMonitorConfig {
    pub check_interval_ms: u64,
    pub trailing_stop_bps: u32,
    pub position_max_age_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    TrailingStop,
    MaxAge,
}

impl ExitReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::TrailingStop => "trailing_stop",
            ExitReason::MaxAge => "max_age",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExitOutcome {
    pub trade_id: String,
    pub reason: ExitReason,
    pub exit_price: Decimal,
    pub pnl: Decimal,
}

/// Tracks filled legs awaiting an exit and drives the trailing-stop / max-age logic.
pub struct PositionMonitor {
    config: PositionMonitorConfig,
    positions: Mutex<HashMap<String, Position>>,
}

impl PositionMonitor {
    #[must_use]
    pub fn new(config: PositionMonitorConfig) -> Self {
        Self {
            config,
            positions: Mutex::new(HashMap::new()),
        }
    }

    pub fn track(&self, position: Position) {
        self.positions.lock().insert(position.trade_id.clone(), position);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs one sweep over all tracked positions, exiting any that trip the
    /// trailing stop or exceed the max holding age. Books losses into
    /// `risk` and fans out a notification for every exit.
    pub async fn check_once(
        &self,
        client: &dyn ExchangeClient,
        resilience: &Resilience,
        risk: &RiskManager,
        notifier: &dyn Notifier,
        now: DateTime<Utc>,
    ) -> Vec<ExitOutcome> {
        let snapshot: Vec<Position> = self.positions.lock().values().cloned().collect();
        let mut outcomes = Vec::new();

        for mut position in snapshot {
            let book_result = resilience
                .call(DEFAULT_TOKENS, || client.get_order_book(&position.token_id))
                .await;
            let Ok(book) = book_result else {
                continue;
            };
            let Some(best_bid) = book.best_bid() else {
                continue;
            };
            position.observe_bid(best_bid);

            let age_ms = now
                .signed_duration_since(position.entered_at)
                .num_milliseconds();

            let trailing_stop_hit = {
                let drawdown_bps = if position.high_water_mark > Decimal::ZERO {
                    (position.high_water_mark - best_bid) / position.high_water_mark
                        * Decimal::from(10_000)
                } else {
                    Decimal::ZERO
                };
                best_bid > Decimal::ZERO && drawdown_bps >= Decimal::from(self.config.trailing_stop_bps)
            };
            let max_age_hit = age_ms >= self.config.position_max_age_ms;

            let reason = if trailing_stop_hit {
                Some(ExitReason::TrailingStop)
            } else if max_age_hit {
                Some(ExitReason::MaxAge)
            } else {
                None
            };

            match reason {
                None => {
                    self.positions
                        .lock()
                        .insert(position.trade_id.clone(), position);
                }
                Some(reason) => {
                    let exit_price = round_down(best_bid);
                    let placed = resilience
                        .call(PLACE_ORDER_TOKENS, || {
                            client.place_order(
                                &position.token_id,
                                super::types::Side::Sell,
                                exit_price,
                                position.size,
                            )
                        })
                        .await;

                    let filled_size = match placed {
                        Ok(order) if order.status == OrderStatus::Filled => Some(order.filled_size),
                        Ok(order) => {
                            poll_exit_fill(client, resilience, &order.id, position.size).await
                        }
                        Err(_) => None,
                    };

                    let Some(filled_size) = filled_size else {
                        // Exit order didn't confirm a fill: the position is
                        // still open and still exposed, so keep tracking it
                        // for the next sweep instead of booking an exit.
                        self.positions
                            .lock()
                            .insert(position.trade_id.clone(), position);
                        continue;
                    };

                    let exposure_delta = exit_price * filled_size;
                    risk.update_exposure(&position.market_name, -exposure_delta);
                    risk.record_order_closed();

                    let pnl = (exit_price - position.entry_price) * filled_size;
                    if pnl < Decimal::ZERO {
                        risk.record_loss(-pnl);
                    }
                    notifier
                        .notify_exit(&position.trade_id, reason.as_str(), pnl)
                        .await;
                    self.positions.lock().remove(&position.trade_id);

                    outcomes.push(ExitOutcome {
                        trade_id: position.trade_id,
                        reason,
                        exit_price,
                        pnl,
                    });
                }
            }
        }
        outcomes
    }
}
