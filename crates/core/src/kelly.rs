//! Kelly Criterion implementation for binary bet sizing.
//!
//! Provides optimal bet sizing for binary outcome markets (e.g., Polymarket)
//! using the Kelly Criterion with fractional Kelly and safety constraints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kelly Criterion bet sizer for binary outcome markets.
///
/// The Kelly formula for binary bets with price `c` and win probability `p` is:
/// ```text
/// f* = (p(b+1) - 1) / b
/// where b = (1-c)/c (net odds)
/// ```
///
/// This simplifies to: `f* = p - c*(1-p)/(1-c) = (p - c) / (1 - c)`
/// Or equivalently: `f* = (p*(1-c) - (1-p)*c) / (1-c)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KellySizer {
    /// Fraction of Kelly to use (0.25 = quarter Kelly)
    pub fraction: Decimal,
    /// Maximum bet size in absolute terms
    pub max_bet: Decimal,
    /// Minimum edge required to place a bet (EV threshold)
    pub min_edge: Decimal,
}

impl Default for KellySizer {
    fn default() -> Self {
        Self {
            fraction: Decimal::new(25, 2),  // 0.25 (quarter Kelly)
            max_bet: Decimal::new(1000, 0), // $1000
            min_edge: Decimal::new(1, 2),   // 0.01 (1% minimum edge)
        }
    }
}

/// Result of Kelly bet sizing calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetDecision {
    /// Whether to place a bet
    pub should_bet: bool,
    /// Recommended stake amount
    pub stake: Decimal,
    /// Full Kelly fraction (before applying fractional Kelly)
    pub full_kelly_fraction: Decimal,
    /// Expected value per dollar wagered
    pub expected_value: Decimal,
    /// Reason for the decision
    pub reason: BetReason,
}

/// Reason for a bet decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetReason {
    /// Bet placed - positive edge found
    PositiveEdge,
    /// No bet - edge below minimum threshold
    InsufficientEdge,
    /// No bet - probability equals price (no edge)
    NoEdge,
    /// No bet - negative expected value
    NegativeEv,
    /// No bet - invalid inputs
    InvalidInputs,
}

impl KellySizer {
    /// Creates a new KellySizer with custom parameters.
    #[must_use]
    pub fn new(fraction: Decimal, max_bet: Decimal, min_edge: Decimal) -> Self {
        Self {
            fraction,
            max_bet,
            min_edge,
        }
    }

    /// Calculates the optimal bet size using fractional Kelly.
    ///
    /// # Arguments
    /// * `win_prob` - Estimated probability of winning (0 to 1)
    /// * `price` - Cost per share (0 to 1) - also the market's implied probability
    /// * `bankroll` - Current bankroll to size the bet against
    ///
    /// # Returns
    /// `BetDecision` with recommended stake and reasoning
    ///
    /// # Examples
    /// ```
    /// use algo_trade_core::kelly::KellySizer;
    /// use rust_decimal_macros::dec;
    ///
    /// let sizer = KellySizer::default();
    /// let decision = sizer.size(dec!(0.6), dec!(0.5), dec!(10000));
    ///
    /// // 60% win prob vs 50% price = positive edge
    /// assert!(decision.should_bet);
    /// assert!(decision.stake > dec!(0));
    /// ```
    #[must_use]
    pub fn size(&self, win_prob: Decimal, price: Decimal, bankroll: Decimal) -> BetDecision {
        // Validate inputs
        if win_prob < Decimal::ZERO
            || win_prob > Decimal::ONE
            || price <= Decimal::ZERO
            || price >= Decimal::ONE
            || bankroll <= Decimal::ZERO
        {
            return BetDecision {
                should_bet: false,
                stake: Decimal::ZERO,
                full_kelly_fraction: Decimal::ZERO,
                expected_value: Decimal::ZERO,
                reason: BetReason::InvalidInputs,
            };
        }

        // Calculate expected value per dollar wagered
        // EV = p * (1 - c) - (1 - p) * c
        // Where p = win probability, c = cost/price
        let win_payout = Decimal::ONE - price; // Profit if win
        let lose_cost = price; // Loss if lose

        let ev = win_prob * win_payout - (Decimal::ONE - win_prob) * lose_cost;

        // Check for no edge
        if win_prob == price {
            return BetDecision {
                should_bet: false,
                stake: Decimal::ZERO,
                full_kelly_fraction: Decimal::ZERO,
                expected_value: Decimal::ZERO,
                reason: BetReason::NoEdge,
            };
        }

        // Check for negative EV
        if ev <= Decimal::ZERO {
            return BetDecision {
                should_bet: false,
                stake: Decimal::ZERO,
                full_kelly_fraction: Decimal::ZERO,
                expected_value: ev,
                reason: BetReason::NegativeEv,
            };
        }

        // Check minimum edge threshold
        // Edge = p - c (simplified measure)
        let edge = win_prob - price;
        if edge < self.min_edge {
            return BetDecision {
                should_bet: false,
                stake: Decimal::ZERO,
                full_kelly_fraction: Decimal::ZERO,
                expected_value: ev,
                reason: BetReason::InsufficientEdge,
            };
        }

        // Calculate full Kelly fraction
        // f* = (p - c) / (1 - c) for binary bets
        let full_kelly = (win_prob - price) / (Decimal::ONE - price);

        // Apply fractional Kelly
        let fractional_kelly = full_kelly * self.fraction;

        // Calculate stake
        let mut stake = bankroll * fractional_kelly;

        // Apply maximum bet cap
        if stake > self.max_bet {
            stake = self.max_bet;
        }

        // Ensure non-negative
        if stake < Decimal::ZERO {
            stake = Decimal::ZERO;
        }

        BetDecision {
            should_bet: stake > Decimal::ZERO,
            stake,
            full_kelly_fraction: full_kelly,
            expected_value: ev,
            reason: BetReason::PositiveEdge,
        }
    }

    /// Calculates expected value without sizing.
    ///
    /// EV = p * (1 - c) - (1 - p) * c
    #[must_use]
    pub fn expected_value(win_prob: Decimal, price: Decimal) -> Decimal {
        if price <= Decimal::ZERO || price >= Decimal::ONE {
            return Decimal::ZERO;
        }
        win_prob * (Decimal::ONE - price) - (Decimal::ONE - win_prob) * price
    }
}
