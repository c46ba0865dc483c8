//! Position sizing: the minimum of four independent caps.
//!
//! The Kelly cap below mirrors the fractional-Kelly shape of
//! `algo_trade_core::kelly::KellySizer` (a `fraction` multiplier applied to a
//! full-Kelly stake) but is derived directly from the riskless-arbitrage edge
//! rather than a win-probability model, since every leg of an arb either all
//! fill or the trade is unwound — there is no probabilistic loss side to a
//! completed arb the way there is for a directional bet.

use rust_decimal::Decimal;

/// Inputs needed to size one detected opportunity.
#[derive(Debug, Clone, Copy)]
pub struct SizingInput {
    /// Smallest per-leg fillable size at the chosen price level.
    pub min_leg_fillable_size: Decimal,
    /// Highest ask price across all legs.
    pub max_ask_price: Decimal,
    /// Sum of all leg ask prices.
    pub ask_sum: Decimal,
    /// Expected profit fraction (1 - allInCost).
    pub edge: Decimal,
    /// Per-market exposure cap, in quote currency.
    pub per_market_max_usd: Decimal,
    /// Remaining global exposure headroom, in quote currency.
    pub remaining_global_exposure_usd: Decimal,
    /// Bankroll used for the Kelly cap.
    pub bankroll_usd: Decimal,
    /// Fraction of full Kelly to risk.
    pub kelly_fraction: Decimal,
}

/// Returns the integer share count to trade: the minimum of the four caps
/// from SPEC_FULL §4.3, floored to a whole share count. Returns 0 when the
/// opportunity is not profitable (`edge <= 0`) or any cap collapses to 0.
#[must_use]
pub fn compute_optimal_size(input: SizingInput) -> Decimal {
    if input.edge <= Decimal::ZERO || input.max_ask_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let cap_leg = input.min_leg_fillable_size;
    let cap_market = input.per_market_max_usd / input.max_ask_price;
    let cap_global = input.remaining_global_exposure_usd / input.max_ask_price;
    let cap_kelly = if input.ask_sum > Decimal::ZERO {
        input.kelly_fraction * input.bankroll_usd * input.edge / input.ask_sum
    } else {
        Decimal::ZERO
    };

    let size = cap_leg.min(cap_market).min(cap_global).min(cap_kelly);
    if size <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        size.floor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_input() -> SizingInput {
        SizingInput {
            min_leg_fillable_size: dec!(1000),
            max_ask_price: dec!(0.51),
            ask_sum: dec!(0.98),
            edge: dec!(0.02),
            per_market_max_usd: dec!(500),
            remaining_global_exposure_usd: dec!(2000),
            bankroll_usd: dec!(1000),
            kelly_fraction: dec!(0.25),
        }
    }

    #[test]
    fn zero_edge_returns_zero() {
        let mut input = base_input();
        input.edge = Decimal::ZERO;
        assert_eq!(compute_optimal_size(input), Decimal::ZERO);
    }

    #[test]
    fn leg_fillable_size_can_bind() {
        let mut input = base_input();
        input.min_leg_fillable_size = dec!(5);
        assert_eq!(compute_optimal_size(input), dec!(5));
    }

    #[test]
    fn per_market_cap_can_bind() {
        let mut input = base_input();
        input.per_market_max_usd = dec!(51); // 51 / 0.51 = 100
        input.min_leg_fillable_size = dec!(10_000);
        input.remaining_global_exposure_usd = dec!(1_000_000);
        input.bankroll_usd = dec!(1_000_000);
        assert_eq!(compute_optimal_size(input), dec!(100));
    }

    #[test]
    fn global_exposure_cap_can_bind() {
        let mut input = base_input();
        input.remaining_global_exposure_usd = dec!(5.1); // 5.1 / 0.51 = 10
        input.min_leg_fillable_size = dec!(10_000);
        input.per_market_max_usd = dec!(1_000_000);
        input.bankroll_usd = dec!(1_000_000);
        assert_eq!(compute_optimal_size(input), dec!(10));
    }

    #[test]
    fn kelly_cap_can_bind() {
        let mut input = base_input();
        input.min_leg_fillable_size = dec!(10_000);
        input.per_market_max_usd = dec!(1_000_000);
        input.remaining_global_exposure_usd = dec!(1_000_000);
        input.bankroll_usd = dec!(100);
        input.kelly_fraction = dec!(0.25);
        // 0.25 * 100 * 0.02 / 0.98 = 0.5102... -> floor 0
        assert_eq!(compute_optimal_size(input), Decimal::ZERO);
    }

    #[test]
    fn floors_to_whole_shares() {
        let mut input = base_input();
        input.min_leg_fillable_size = dec!(100.9);
        input.per_market_max_usd = dec!(1_000_000);
        input.remaining_global_exposure_usd = dec!(1_000_000);
        input.bankroll_usd = dec!(1_000_000);
        assert_eq!(compute_optimal_size(input), dec!(100));
    }
}
