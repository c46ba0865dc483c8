//! Arbitrage detectors: binary-complement pairs and N-way outcome sets.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::cost_model::{compute_cost_breakdown, quick_reject};
use super::orderbook::simulate_fill;
use super::sizer::{compute_optimal_size, SizingInput};
use super::types::{Opportunity, OpportunityLeg, OrderBook, Side};

/// Parameters shared by both detectors, drawn from `ArbitrageConfig`.
#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    pub min_profit: Decimal,
    pub fee_bps: Decimal,
    pub slippage_bps: Decimal,
    pub min_top_size_usd: Decimal,
    pub max_spread_bps: Option<u32>,
    pub use_book_depth_for_detection: bool,
    pub staleness_ms: i64,
}

/// Sizing context threaded through to the `Sizer` at detection time.
#[derive(Debug, Clone, Copy)]
pub struct ExposureContext {
    pub per_market_max_usd: Decimal,
    pub remaining_global_exposure_usd: Decimal,
    pub bankroll_usd: Decimal,
    pub kelly_fraction: Decimal,
}

fn spread_bps(ask: Decimal, bid: Decimal) -> Decimal {
    if ask <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (ask - bid) / ask * Decimal::from(10_000)
}

fn passes_spread_filter(legs: &[(Decimal, Decimal)], max_spread_bps: Option<u32>) -> bool {
    match max_spread_bps {
        None => true,
        Some(max) => legs
            .iter()
            .all(|(ask, bid)| spread_bps(*ask, *bid) <= Decimal::from(max)),
    }
}

/// One leg's best bid/ask/size, as read from a fresh book.
#[derive(Debug, Clone, Copy)]
struct LegQuote {
    ask_price: Decimal,
    ask_size: Decimal,
    bid_price: Decimal,
}

fn leg_quote(book: &OrderBook) -> Option<LegQuote> {
    Some(LegQuote {
        ask_price: book.best_ask()?,
        ask_size: book.best_ask_size()?,
        bid_price: book.best_bid().unwrap_or(Decimal::ZERO),
    })
}

/// Shrinks `target_size_shares` to the smallest VWAP-fillable size across legs,
/// recomputing the cost breakdown on the walked VWAPs. Returns `None` if any
/// leg has zero depth.
fn revalidate_with_book_depth(
    books: &[&OrderBook],
    target_size_shares: Decimal,
    fee_bps: Decimal,
    slippage_bps: Decimal,
) -> Option<(Decimal, super::cost_model::CostBreakdown, Vec<Decimal>)> {
    let mut vwaps = Vec::with_capacity(books.len());
    let mut fillable_sizes = Vec::with_capacity(books.len());
    for book in books {
        let fill = simulate_fill(book, Side::Buy, target_size_shares)?;
        vwaps.push(fill.vwap);
        fillable_sizes.push(fill.filled);
    }
    let shrunk_size = fillable_sizes
        .iter()
        .copied()
        .fold(target_size_shares, Decimal::min);
    let breakdown = compute_cost_breakdown(&vwaps, fee_bps, slippage_bps);
    Some((shrunk_size, breakdown, vwaps))
}

/// Detects a binary-complement (YES/NO) arbitrage from two fresh books.
/// Returns at most one opportunity, with a freshly minted trade id.
#[must_use]
pub fn detect_binary_complement(
    market_name: &str,
    yes_token_id: &str,
    no_token_id: &str,
    yes_book: &OrderBook,
    no_book: &OrderBook,
    config: &DetectorConfig,
    exposure: &ExposureContext,
    now_ms: i64,
) -> Option<Opportunity> {
    if yes_book.is_stale(now_ms, config.staleness_ms) || no_book.is_stale(now_ms, config.staleness_ms) {
        return None;
    }
    let yes = leg_quote(yes_book)?;
    let no = leg_quote(no_book)?;

    if quick_reject(&[yes.ask_price, no.ask_price]) {
        return None;
    }

    let breakdown = compute_cost_breakdown(&[yes.ask_price, no.ask_price], config.fee_bps, config.slippage_bps);
    if breakdown.expected_profit < config.min_profit {
        return None;
    }

    if yes.ask_size * yes.ask_price < config.min_top_size_usd
        || no.ask_size * no.ask_price < config.min_top_size_usd
    {
        return None;
    }

    if !passes_spread_filter(
        &[(yes.ask_price, yes.bid_price), (no.ask_price, no.bid_price)],
        config.max_spread_bps,
    ) {
        return None;
    }

    let min_leg_fillable_size = yes.ask_size.min(no.ask_size);
    let target_size_shares = compute_optimal_size(SizingInput {
        min_leg_fillable_size,
        max_ask_price: yes.ask_price.max(no.ask_price),
        ask_sum: breakdown.total_cost,
        edge: breakdown.expected_profit,
        per_market_max_usd: exposure.per_market_max_usd,
        remaining_global_exposure_usd: exposure.remaining_global_exposure_usd,
        bankroll_usd: exposure.bankroll_usd,
        kelly_fraction: exposure.kelly_fraction,
    });
    if target_size_shares <= Decimal::ZERO {
        return None;
    }

    let (final_size, final_breakdown) = if config.use_book_depth_for_detection {
        let (shrunk, revalidated, _) = revalidate_with_book_depth(
            &[yes_book, no_book],
            target_size_shares,
            config.fee_bps,
            config.slippage_bps,
        )?;
        if revalidated.expected_profit < config.min_profit || shrunk <= Decimal::ZERO {
            return None;
        }
        (shrunk, revalidated)
    } else {
        (target_size_shares, breakdown)
    };

    Some(Opportunity::BinaryComplement {
        trade_id: Uuid::new_v4().to_string(),
        market_name: market_name.to_string(),
        total_cost: final_breakdown.total_cost,
        fee_cost: final_breakdown.fee_cost,
        slippage_cost: final_breakdown.slippage_cost,
        all_in_cost: final_breakdown.all_in_cost,
        expected_profit: final_breakdown.expected_profit,
        expected_profit_bps: final_breakdown.expected_profit_bps,
        target_size_shares: final_size,
        detected_at: chrono::Utc::now(),
        yes_token_id: yes_token_id.to_string(),
        no_token_id: no_token_id.to_string(),
        ask_yes: yes.ask_price,
        ask_no: no.ask_price,
        bid_yes: yes.bid_price,
        bid_no: no.bid_price,
        size_yes: final_size,
        size_no: final_size,
    })
}

/// One outcome's token id, label, and fresh book, for multi-outcome detection.
pub struct OutcomeBook<'a> {
    pub label: &'a str,
    pub token_id: &'a str,
    pub book: &'a OrderBook,
}

/// Detects an N-way (N >= 2) outcome-set arbitrage from fresh books.
#[must_use]
pub fn detect_multi_outcome(
    market_name: &str,
    outcomes: &[OutcomeBook<'_>],
    config: &DetectorConfig,
    exposure: &ExposureContext,
    now_ms: i64,
) -> Option<Opportunity> {
    if outcomes.len() < 2 {
        return None;
    }
    if outcomes
        .iter()
        .any(|o| o.book.is_stale(now_ms, config.staleness_ms))
    {
        return None;
    }

    let quotes: Vec<LegQuote> = outcomes.iter().map(|o| leg_quote(o.book)).collect::<Option<_>>()?;

    let ask_prices: Vec<Decimal> = quotes.iter().map(|q| q.ask_price).collect();
    if quick_reject(&ask_prices) {
        return None;
    }

    if quotes
        .iter()
        .any(|q| q.ask_size * q.ask_price < config.min_top_size_usd)
    {
        return None;
    }

    let spread_pairs: Vec<(Decimal, Decimal)> =
        quotes.iter().map(|q| (q.ask_price, q.bid_price)).collect();
    if !passes_spread_filter(&spread_pairs, config.max_spread_bps) {
        return None;
    }

    let breakdown = compute_cost_breakdown(&ask_prices, config.fee_bps, config.slippage_bps);
    if breakdown.expected_profit < config.min_profit {
        return None;
    }

    let min_leg_fillable_size = quotes
        .iter()
        .map(|q| q.ask_size)
        .fold(Decimal::MAX, Decimal::min);
    let max_ask_price = ask_prices.iter().copied().fold(Decimal::ZERO, Decimal::max);
    let target_size_shares = compute_optimal_size(SizingInput {
        min_leg_fillable_size,
        max_ask_price,
        ask_sum: breakdown.total_cost,
        edge: breakdown.expected_profit,
        per_market_max_usd: exposure.per_market_max_usd,
        remaining_global_exposure_usd: exposure.remaining_global_exposure_usd,
        bankroll_usd: exposure.bankroll_usd,
        kelly_fraction: exposure.kelly_fraction,
    });
    if target_size_shares <= Decimal::ZERO {
        return None;
    }

    let books: Vec<&OrderBook> = outcomes.iter().map(|o| o.book).collect();
    let (final_size, final_breakdown) = if config.use_book_depth_for_detection {
        let (shrunk, revalidated, _) = revalidate_with_book_depth(
            &books,
            target_size_shares,
            config.fee_bps,
            config.slippage_bps,
        )?;
        if revalidated.expected_profit < config.min_profit || shrunk <= Decimal::ZERO {
            return None;
        }
        (shrunk, revalidated)
    } else {
        (target_size_shares, breakdown)
    };

    let legs = outcomes
        .iter()
        .zip(quotes.iter())
        .map(|(outcome, quote)| OpportunityLeg {
            label: outcome.label.to_string(),
            token_id: outcome.token_id.to_string(),
            ask_price: quote.ask_price,
            bid_price: quote.bid_price,
            ask_size: final_size,
        })
        .collect();

    Some(Opportunity::MultiOutcome {
        trade_id: Uuid::new_v4().to_string(),
        market_name: market_name.to_string(),
        total_cost: final_breakdown.total_cost,
        fee_cost: final_breakdown.fee_cost,
        slippage_cost: final_breakdown.slippage_cost,
        all_in_cost: final_breakdown.all_in_cost,
        expected_profit: final_breakdown.expected_profit,
        expected_profit_bps: final_breakdown.expected_profit_bps,
        target_size_shares: final_size,
        detected_at: chrono::Utc::now(),
        legs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn book(token_id: &str, bids: Vec<(Decimal, Decimal)>, asks: Vec<(Decimal, Decimal)>, now_ms: i64) -> OrderBook {
        let mut b = OrderBook::new(token_id, now_ms);
        b.apply_snapshot(bids, asks, now_ms);
        b
    }

    fn config() -> DetectorConfig {
        DetectorConfig {
            min_profit: dec!(0.01),
            fee_bps: Decimal::ZERO,
            slippage_bps: Decimal::ZERO,
            min_top_size_usd: dec!(1),
            max_spread_bps: None,
            use_book_depth_for_detection: false,
            staleness_ms: 5_000,
        }
    }

    fn exposure() -> ExposureContext {
        ExposureContext {
            per_market_max_usd: dec!(1_000),
            remaining_global_exposure_usd: dec!(10_000),
            bankroll_usd: dec!(10_000),
            kelly_fraction: dec!(1),
        }
    }

    // spec scenario 1: yes ask 0.47/size 1000, no ask 0.51/size 1000 -> profitable
    #[test]
    fn detects_binary_complement_opportunity() {
        let yes = book(
            "Y",
            vec![(dec!(0.46), dec!(1000))],
            vec![(dec!(0.47), dec!(1000))],
            1_000,
        );
        let no = book(
            "N",
            vec![(dec!(0.50), dec!(1000))],
            vec![(dec!(0.51), dec!(1000))],
            1_000,
        );
        let opp =
            detect_binary_complement("m", "Y", "N", &yes, &no, &config(), &exposure(), 1_000)
                .unwrap();
        assert_eq!(opp.expected_profit(), dec!(0.02));
        assert!(opp.target_size_shares() > Decimal::ZERO);
    }

    // spec scenario 2: quick reject when asks sum >= 1
    #[test]
    fn rejects_when_asks_sum_to_one_or_more() {
        let yes = book(
            "Y",
            vec![(dec!(0.54), dec!(1000))],
            vec![(dec!(0.55), dec!(1000))],
            1_000,
        );
        let no = book(
            "N",
            vec![(dec!(0.49), dec!(1000))],
            vec![(dec!(0.50), dec!(1000))],
            1_000,
        );
        assert!(
            detect_binary_complement("m", "Y", "N", &yes, &no, &config(), &exposure(), 1_000)
                .is_none()
        );
    }

    #[test]
    fn rejects_stale_books() {
        let yes = book(
            "Y",
            vec![(dec!(0.46), dec!(1000))],
            vec![(dec!(0.47), dec!(1000))],
            0,
        );
        let no = book(
            "N",
            vec![(dec!(0.50), dec!(1000))],
            vec![(dec!(0.51), dec!(1000))],
            0,
        );
        assert!(
            detect_binary_complement("m", "Y", "N", &yes, &no, &config(), &exposure(), 10_000)
                .is_none()
        );
    }

    #[test]
    fn rejects_below_min_top_size() {
        let mut cfg = config();
        cfg.min_top_size_usd = dec!(10_000);
        let yes = book(
            "Y",
            vec![(dec!(0.46), dec!(1000))],
            vec![(dec!(0.47), dec!(10))],
            1_000,
        );
        let no = book(
            "N",
            vec![(dec!(0.50), dec!(1000))],
            vec![(dec!(0.51), dec!(10))],
            1_000,
        );
        assert!(
            detect_binary_complement("m", "Y", "N", &yes, &no, &cfg, &exposure(), 1_000).is_none()
        );
    }

    #[test]
    fn rejects_when_spread_filter_fails() {
        let mut cfg = config();
        cfg.max_spread_bps = Some(1);
        let yes = book(
            "Y",
            vec![(dec!(0.30), dec!(1000))],
            vec![(dec!(0.47), dec!(1000))],
            1_000,
        );
        let no = book(
            "N",
            vec![(dec!(0.50), dec!(1000))],
            vec![(dec!(0.51), dec!(1000))],
            1_000,
        );
        assert!(
            detect_binary_complement("m", "Y", "N", &yes, &no, &cfg, &exposure(), 1_000).is_none()
        );
    }

    // spec scenario 4: three-leg multi-outcome at 0.30/0.29/0.31
    #[test]
    fn detects_multi_outcome_opportunity() {
        let a = book("a", vec![(dec!(0.29), dec!(500))], vec![(dec!(0.30), dec!(500))], 1_000);
        let b = book("b", vec![(dec!(0.28), dec!(500))], vec![(dec!(0.29), dec!(500))], 1_000);
        let c = book("c", vec![(dec!(0.30), dec!(500))], vec![(dec!(0.31), dec!(500))], 1_000);
        let outcomes = vec![
            OutcomeBook { label: "A", token_id: "a", book: &a },
            OutcomeBook { label: "B", token_id: "b", book: &b },
            OutcomeBook { label: "C", token_id: "c", book: &c },
        ];
        let opp = detect_multi_outcome("election", &outcomes, &config(), &exposure(), 1_000).unwrap();
        assert_eq!(opp.expected_profit(), dec!(0.10));
    }

    #[test]
    fn multi_outcome_requires_at_least_two_legs() {
        let a = book("a", vec![(dec!(0.29), dec!(500))], vec![(dec!(0.30), dec!(500))], 1_000);
        let outcomes = vec![OutcomeBook { label: "A", token_id: "a", book: &a }];
        assert!(detect_multi_outcome("m", &outcomes, &config(), &exposure(), 1_000).is_none());
    }

    #[test]
    fn book_depth_revalidation_shrinks_size() {
        let mut cfg = config();
        cfg.use_book_depth_for_detection = true;
        let yes = book(
            "Y",
            vec![(dec!(0.46), dec!(1000))],
            vec![(dec!(0.47), dec!(50)), (dec!(0.60), dec!(1000))],
            1_000,
        );
        let no = book(
            "N",
            vec![(dec!(0.50), dec!(1000))],
            vec![(dec!(0.51), dec!(1000))],
            1_000,
        );
        let mut exp = exposure();
        exp.bankroll_usd = dec!(1_000_000);
        exp.remaining_global_exposure_usd = dec!(1_000_000);
        exp.per_market_max_usd = dec!(1_000_000);
        let result = detect_binary_complement("m", "Y", "N", &yes, &no, &cfg, &exp, 1_000);
        // deep second ask level drags the VWAP above breakeven for the full size,
        // so either the opportunity shrinks to the shallow level or disappears.
        if let Some(opp) = result {
            assert!(opp.target_size_shares() <= dec!(50));
        }
    }
}
