//! Cost and profitability computation shared by every detector.
//!
//! Generalizes the reference workspace's Polymarket-specific `E[Fee] = 0.01 *
//! (2 - pair_cost)` formula into the exchange-agnostic linear `feeBps` /
//! `slippageBps` model, while keeping the same quick-reject-then-breakdown
//! shape as `Phase1Config::validate_opportunity`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Full accounting of one candidate trade's cost and expected profit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBreakdown {
    pub total_cost: Decimal,
    pub fee_cost: Decimal,
    pub slippage_cost: Decimal,
    pub all_in_cost: Decimal,
    pub expected_profit: Decimal,
    pub expected_profit_bps: Decimal,
}

const BPS_DENOMINATOR: Decimal = dec!(10_000);

/// Computes the cost breakdown for a set of leg ask prices.
///
/// `fee_bps` should already be the effective fee (caller resolves
/// `taker_fee_bps` over `fee_bps`, per [`algo_trade_core::ArbitrageConfig::effective_fee_bps`]).
#[must_use]
pub fn compute_cost_breakdown(
    ask_prices: &[Decimal],
    fee_bps: Decimal,
    slippage_bps: Decimal,
) -> CostBreakdown {
    let total_cost: Decimal = ask_prices.iter().copied().sum();
    let fee_cost = total_cost * fee_bps / BPS_DENOMINATOR;
    let slippage_cost = total_cost * slippage_bps / BPS_DENOMINATOR;
    let all_in_cost = total_cost + fee_cost + slippage_cost;
    let expected_profit = Decimal::ONE - all_in_cost;
    CostBreakdown {
        total_cost,
        fee_cost,
        slippage_cost,
        all_in_cost,
        expected_profit,
        expected_profit_bps: expected_profit * BPS_DENOMINATOR,
    }
}

/// `true` when the raw sum of ask prices already meets or exceeds one unit of
/// quote currency — no further work (fees, sizing) can make this profitable.
#[must_use]
pub fn quick_reject(ask_prices: &[Decimal]) -> bool {
    ask_prices.iter().copied().sum::<Decimal>() >= Decimal::ONE
}

/// Per-leg VWAP fill result used by [`compute_cost_breakdown_vwap`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegFill {
    pub vwap: Decimal,
    pub fillable_size: Decimal,
}

/// Walks full ask depth for each leg (via the caller-supplied VWAP walker) up
/// to `target_shares`, then computes the breakdown on the resulting VWAPs.
///
/// `walk` takes `(leg_index, target_shares)` and returns the VWAP fill for
/// that leg — callers typically delegate to [`crate::arbitrage::orderbook::simulate_fill`]
/// for each leg's book. Returns `None` if there are no legs.
pub fn compute_cost_breakdown_vwap(
    target_shares: Decimal,
    fee_bps: Decimal,
    slippage_bps: Decimal,
    mut walk: impl FnMut(usize) -> Option<LegFill>,
    leg_count: usize,
) -> Option<(CostBreakdown, Vec<LegFill>)> {
    if leg_count == 0 {
        return None;
    }
    let mut fills = Vec::with_capacity(leg_count);
    for i in 0..leg_count {
        fills.push(walk(i)?);
    }
    let raw_sum: Decimal = fills.iter().map(|f| f.vwap).sum();
    if quick_reject(&[raw_sum]) {
        return Some((
            CostBreakdown {
                total_cost: raw_sum,
                fee_cost: Decimal::ZERO,
                slippage_cost: Decimal::ZERO,
                all_in_cost: raw_sum,
                expected_profit: Decimal::ONE - raw_sum,
                expected_profit_bps: (Decimal::ONE - raw_sum) * BPS_DENOMINATOR,
            },
            fills,
        ));
    }
    let vwaps: Vec<Decimal> = fills.iter().map(|f| f.vwap).collect();
    let breakdown = compute_cost_breakdown(&vwaps, fee_bps, slippage_bps);
    let _ = target_shares;
    Some((breakdown, fills))
}
