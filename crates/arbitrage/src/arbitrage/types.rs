//! Core data types shared across the arbitrage engine.
//!
//! - [`OrderBook`]: per-token L2 order book with staleness tracking.
//! - [`Market`]: a binary or N-way outcome market.
//! - [`Opportunity`]: a detected, not-yet-executed arbitrage.
//! - [`Order`]: the exchange-side order state machine.
//! - [`Position`]: a monitored, filled leg awaiting exit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// Order type for execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Fill-or-Kill: must fill entirely or cancel.
    Fok,
    /// Fill-and-Kill: fill what's available, cancel the rest.
    Fak,
    /// Good-til-Cancelled: rests on the book until filled or cancelled.
    Gtc,
}

/// One price/size level of an order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBookLevel {
    pub price: Decimal,
    pub size: Decimal,
}

/// L2 order book for a single token, keyed by the opaque exchange token id.
#[derive(Debug, Clone)]
pub struct OrderBook {
    pub token_id: String,
    /// Bid levels, sorted descending by price.
    pub bids: BTreeMap<Reverse<Decimal>, Decimal>,
    /// Ask levels, sorted ascending by price.
    pub asks: BTreeMap<Decimal, Decimal>,
    /// Wall-clock milliseconds at insertion.
    pub last_updated_ms: i64,
}

impl OrderBook {
    #[must_use]
    pub fn new(token_id: impl Into<String>, now_ms: i64) -> Self {
        Self {
            token_id: token_id.into(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            last_updated_ms: now_ms,
        }
    }

    #[must_use]
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.keys().next().map(|r| r.0)
    }

    #[must_use]
    pub fn best_bid_size(&self) -> Option<Decimal> {
        self.bids.values().next().copied()
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.keys().next().copied()
    }

    #[must_use]
    pub fn best_ask_size(&self) -> Option<Decimal> {
        self.asks.values().next().copied()
    }

    /// Replaces all levels with a fresh snapshot and stamps the update time.
    pub fn apply_snapshot(
        &mut self,
        bids: Vec<(Decimal, Decimal)>,
        asks: Vec<(Decimal, Decimal)>,
        now_ms: i64,
    ) {
        self.bids.clear();
        self.asks.clear();
        for (price, size) in bids {
            if size > Decimal::ZERO {
                self.bids.insert(Reverse(price), size);
            }
        }
        for (price, size) in asks {
            if size > Decimal::ZERO {
                self.asks.insert(price, size);
            }
        }
        self.last_updated_ms = now_ms;
    }

    /// True when the book has not been refreshed within `staleness_ms`.
    #[must_use]
    pub fn is_stale(&self, now_ms: i64, staleness_ms: i64) -> bool {
        now_ms - self.last_updated_ms > staleness_ms
    }

    #[must_use]
    pub fn has_liquidity(&self) -> bool {
        !self.bids.is_empty() && !self.asks.is_empty()
    }
}

/// A market, either a binary complement pair or an N-way outcome set.
#[derive(Debug, Clone)]
pub enum Market {
    Binary {
        name: String,
        yes_token_id: String,
        no_token_id: String,
    },
    Multi {
        name: String,
        outcomes: Vec<MarketOutcome>,
    },
}

#[derive(Debug, Clone)]
pub struct MarketOutcome {
    pub label: String,
    pub token_id: String,
}

impl Market {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Market::Binary { name, .. } | Market::Multi { name, .. } => name,
        }
    }

    /// All token ids participating in this market, in a stable declared order.
    #[must_use]
    pub fn token_ids(&self) -> Vec<&str> {
        match self {
            Market::Binary {
                yes_token_id,
                no_token_id,
                ..
            } => vec![yes_token_id.as_str(), no_token_id.as_str()],
            Market::Multi { outcomes, .. } => {
                outcomes.iter().map(|o| o.token_id.as_str()).collect()
            }
        }
    }
}

/// One leg of a multi-outcome opportunity.
#[derive(Debug, Clone, Serialize)]
pub struct OpportunityLeg {
    pub label: String,
    pub token_id: String,
    pub ask_price: Decimal,
    pub bid_price: Decimal,
    pub ask_size: Decimal,
}

/// A detected, not-yet-executed arbitrage. Produced once per detector call,
/// consumed at most once, and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Opportunity {
    BinaryComplement {
        trade_id: String,
        market_name: String,
        total_cost: Decimal,
        fee_cost: Decimal,
        slippage_cost: Decimal,
        all_in_cost: Decimal,
        expected_profit: Decimal,
        expected_profit_bps: Decimal,
        target_size_shares: Decimal,
        detected_at: DateTime<Utc>,
        yes_token_id: String,
        no_token_id: String,
        ask_yes: Decimal,
        ask_no: Decimal,
        bid_yes: Decimal,
        bid_no: Decimal,
        size_yes: Decimal,
        size_no: Decimal,
    },
    MultiOutcome {
        trade_id: String,
        market_name: String,
        total_cost: Decimal,
        fee_cost: Decimal,
        slippage_cost: Decimal,
        all_in_cost: Decimal,
        expected_profit: Decimal,
        expected_profit_bps: Decimal,
        target_size_shares: Decimal,
        detected_at: DateTime<Utc>,
        legs: Vec<OpportunityLeg>,
    },
}

impl Opportunity {
    #[must_use]
    pub fn trade_id(&self) -> &str {
        match self {
            Opportunity::BinaryComplement { trade_id, .. }
            | Opportunity::MultiOutcome { trade_id, .. } => trade_id,
        }
    }

    #[must_use]
    pub fn market_name(&self) -> &str {
        match self {
            Opportunity::BinaryComplement { market_name, .. }
            | Opportunity::MultiOutcome { market_name, .. } => market_name,
        }
    }

    #[must_use]
    pub fn expected_profit(&self) -> Decimal {
        match self {
            Opportunity::BinaryComplement { expected_profit, .. }
            | Opportunity::MultiOutcome { expected_profit, .. } => *expected_profit,
        }
    }

    #[must_use]
    pub fn expected_profit_bps(&self) -> Decimal {
        match self {
            Opportunity::BinaryComplement {
                expected_profit_bps,
                ..
            }
            | Opportunity::MultiOutcome {
                expected_profit_bps,
                ..
            } => *expected_profit_bps,
        }
    }

    #[must_use]
    pub fn target_size_shares(&self) -> Decimal {
        match self {
            Opportunity::BinaryComplement {
                target_size_shares, ..
            }
            | Opportunity::MultiOutcome {
                target_size_shares, ..
            } => *target_size_shares,
        }
    }

    #[must_use]
    pub fn all_in_cost(&self) -> Decimal {
        match self {
            Opportunity::BinaryComplement { all_in_cost, .. }
            | Opportunity::MultiOutcome { all_in_cost, .. } => *all_in_cost,
        }
    }

    /// Token ids involved, in a stable order, for cooldown-key construction.
    #[must_use]
    pub fn token_ids(&self) -> Vec<String> {
        match self {
            Opportunity::BinaryComplement {
                yes_token_id,
                no_token_id,
                ..
            } => vec![yes_token_id.clone(), no_token_id.clone()],
            Opportunity::MultiOutcome { legs, .. } => {
                legs.iter().map(|l| l.token_id.clone()).collect()
            }
        }
    }

    /// Per-leg `(token_id, ask_price, ask_size)` in execution order.
    #[must_use]
    pub fn legs(&self) -> Vec<(String, Decimal, Decimal)> {
        match self {
            Opportunity::BinaryComplement {
                yes_token_id,
                no_token_id,
                ask_yes,
                ask_no,
                size_yes,
                size_no,
                ..
            } => vec![
                (yes_token_id.clone(), *ask_yes, *size_yes),
                (no_token_id.clone(), *ask_no, *size_no),
            ],
            Opportunity::MultiOutcome { legs, .. } => legs
                .iter()
                .map(|l| (l.token_id.clone(), l.ask_price, l.ask_size))
                .collect(),
        }
    }
}

/// Order lifecycle status. Terminal states never transition further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    Partial,
    Filled,
    Cancelled,
    Expired,
}

impl OrderStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Expired
        )
    }
}

/// An order placed with the exchange.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: String,
    pub token_id: String,
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
    pub filled_size: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub fn fill_fraction(&self) -> Decimal {
        if self.size == Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.filled_size / self.size
    }
}

/// A filled leg tracked by the position monitor for an eventual exit.
#[derive(Debug, Clone)]
pub struct Position {
    pub trade_id: String,
    pub market_name: String,
    pub token_id: String,
    pub entry_price: Decimal,
    pub size: Decimal,
    pub entered_at: DateTime<Utc>,
    pub high_water_mark: Decimal,
}

impl Position {
    #[must_use]
    pub fn new(
        trade_id: impl Into<String>,
        market_name: impl Into<String>,
        token_id: impl Into<String>,
        entry_price: Decimal,
        size: Decimal,
        entered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            trade_id: trade_id.into(),
            market_name: market_name.into(),
            token_id: token_id.into(),
            entry_price,
            size,
            entered_at,
            high_water_mark: entry_price,
        }
    }

    /// Advances the high-water mark; never moves it backwards.
    pub fn observe_bid(&mut self, bid: Decimal) {
        if bid > self.high_water_mark {
            self.high_water_mark = bid;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_book() -> OrderBook {
        let mut book = OrderBook::new("tok", 1_000);
        book.apply_snapshot(
            vec![(dec!(0.48), dec!(100)), (dec!(0.47), dec!(200))],
            vec![(dec!(0.50), dec!(150)), (dec!(0.51), dec!(250))],
            1_000,
        );
        book
    }

    #[test]
    fn best_bid_and_ask() {
        let book = test_book();
        assert_eq!(book.best_bid(), Some(dec!(0.48)));
        assert_eq!(book.best_ask(), Some(dec!(0.50)));
    }

    #[test]
    fn staleness_check() {
        let book = test_book();
        assert!(!book.is_stale(3_000, 5_000));
        assert!(book.is_stale(10_000, 5_000));
    }

    #[test]
    fn snapshot_filters_zero_size_levels() {
        let mut book = OrderBook::new("tok", 0);
        book.apply_snapshot(
            vec![(dec!(0.48), Decimal::ZERO), (dec!(0.47), dec!(100))],
            vec![(dec!(0.52), dec!(100))],
            0,
        );
        assert_eq!(book.bids.len(), 1);
    }

    #[test]
    fn market_token_ids_binary() {
        let market = Market::Binary {
            name: "will-it-rain".into(),
            yes_token_id: "Y".into(),
            no_token_id: "N".into(),
        };
        assert_eq!(market.token_ids(), vec!["Y", "N"]);
    }

    #[test]
    fn market_token_ids_multi() {
        let market = Market::Multi {
            name: "election".into(),
            outcomes: vec![
                MarketOutcome {
                    label: "A".into(),
                    token_id: "a".into(),
                },
                MarketOutcome {
                    label: "B".into(),
                    token_id: "b".into(),
                },
            ],
        };
        assert_eq!(market.token_ids(), vec!["a", "b"]);
    }

    #[test]
    fn opportunity_accessors_binary() {
        let opp = Opportunity::BinaryComplement {
            trade_id: "t1".into(),
            market_name: "m".into(),
            total_cost: dec!(0.98),
            fee_cost: Decimal::ZERO,
            slippage_cost: Decimal::ZERO,
            all_in_cost: dec!(0.98),
            expected_profit: dec!(0.02),
            expected_profit_bps: dec!(200),
            target_size_shares: dec!(100),
            detected_at: Utc::now(),
            yes_token_id: "Y".into(),
            no_token_id: "N".into(),
            ask_yes: dec!(0.47),
            ask_no: dec!(0.51),
            bid_yes: dec!(0.46),
            bid_no: dec!(0.50),
            size_yes: dec!(100),
            size_no: dec!(100),
        };
        assert_eq!(opp.trade_id(), "t1");
        assert_eq!(opp.token_ids(), vec!["Y".to_string(), "N".to_string()]);
        assert_eq!(opp.legs().len(), 2);
    }

    #[test]
    fn order_fill_fraction() {
        let order = Order {
            id: "o1".into(),
            token_id: "Y".into(),
            side: Side::Buy,
            price: dec!(0.5),
            size: dec!(100),
            filled_size: dec!(60),
            status: OrderStatus::Partial,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(order.fill_fraction(), dec!(0.6));
        assert!(!order.status.is_terminal());
    }

    #[test]
    fn position_high_water_mark_is_monotone() {
        let mut pos = Position::new("t1", "m", "Y", dec!(0.47), dec!(100), Utc::now());
        pos.observe_bid(dec!(0.50));
        assert_eq!(pos.high_water_mark, dec!(0.50));
        pos.observe_bid(dec!(0.45));
        assert_eq!(pos.high_water_mark, dec!(0.50));
    }
}
