//! Order book walking algorithm for VWAP fill simulation.
//!
//! Provides [`simulate_fill`] to calculate the actual cost of filling an
//! order of a given size by walking price levels in execution order.

use rust_decimal::Decimal;

use super::types::{OrderBook, Side};

/// Result of walking the order book for a given target size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillSimulation {
    /// Amount that could be filled.
    pub filled: Decimal,
    /// Total cost of the fill (sum of price * size at each level).
    pub total_cost: Decimal,
    /// Volume-weighted average price.
    pub vwap: Decimal,
    /// Worst (least favorable) price encountered.
    pub worst_price: Decimal,
    /// Best (most favorable) price encountered.
    pub best_price: Decimal,
    /// Whether there was sufficient depth to fill the entire target size.
    pub sufficient_depth: bool,
}

/// Walks the order book to calculate the actual fill cost for a given size.
///
/// For buy orders this walks ask levels (ascending); for sell orders it walks
/// bid levels (descending). Returns `None` if the book has no liquidity on
/// the relevant side or `target_size` is not strictly positive.
#[must_use]
pub fn simulate_fill(book: &OrderBook, side: Side, target_size: Decimal) -> Option<FillSimulation> {
    if target_size <= Decimal::ZERO {
        return None;
    }

    let levels: Vec<(Decimal, Decimal)> = match side {
        Side::Buy => book.asks.iter().map(|(p, s)| (*p, *s)).collect(),
        Side::Sell => book.bids.iter().map(|(r, s)| (r.0, *s)).collect(),
    };

    if levels.is_empty() {
        return None;
    }

    let mut filled = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;
    let mut worst_price = Decimal::ZERO;
    let best_price = levels.first().map(|(p, _)| *p)?;

    for (price, size) in &levels {
        if filled >= target_size {
            break;
        }
        let remaining = target_size - filled;
        let take = (*size).min(remaining);
        total_cost += take * price;
        filled += take;
        worst_price = *price;
    }

    let sufficient_depth = filled >= target_size;
    let vwap = if filled > Decimal::ZERO {
        total_cost / filled
    } else {
        Decimal::ZERO
    };

    Some(FillSimulation {
        filled,
        total_cost,
        vwap,
        worst_price,
        best_price,
        sufficient_depth,
    })
}

/// Total size available at or better than `price_limit`.
#[must_use]
pub fn depth_at_price(book: &OrderBook, side: Side, price_limit: Decimal) -> Decimal {
    match side {
        Side::Buy => book
            .asks
            .iter()
            .filter(|(p, _)| **p <= price_limit)
            .map(|(_, s)| *s)
            .sum(),
        Side::Sell => book
            .bids
            .iter()
            .filter(|(r, _)| r.0 >= price_limit)
            .map(|(_, s)| *s)
            .sum(),
    }
}

/// Difference between the worst fill price and the best price for a given size.
#[must_use]
pub fn price_impact(book: &OrderBook, side: Side, size: Decimal) -> Option<Decimal> {
    let fill = simulate_fill(book, side, size)?;
    if fill.sufficient_depth {
        Some((fill.worst_price - fill.best_price).abs())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn create_test_orderbook() -> OrderBook {
        let mut book = OrderBook::new("test-token", 0);
        book.apply_snapshot(
            vec![
                (dec!(0.48), dec!(100)),
                (dec!(0.47), dec!(200)),
                (dec!(0.46), dec!(300)),
            ],
            vec![
                (dec!(0.50), dec!(100)),
                (dec!(0.51), dec!(200)),
                (dec!(0.52), dec!(300)),
            ],
            0,
        );
        book
    }

    #[test]
    fn simulate_fill_buy_single_level() {
        let book = create_test_orderbook();
        let fill = simulate_fill(&book, Side::Buy, dec!(50)).unwrap();

        assert_eq!(fill.filled, dec!(50));
        assert_eq!(fill.total_cost, dec!(25));
        assert_eq!(fill.vwap, dec!(0.50));
        assert_eq!(fill.best_price, dec!(0.50));
        assert_eq!(fill.worst_price, dec!(0.50));
        assert!(fill.sufficient_depth);
    }

    #[test]
    fn simulate_fill_buy_multiple_levels() {
        let book = create_test_orderbook();
        let fill = simulate_fill(&book, Side::Buy, dec!(150)).unwrap();

        assert_eq!(fill.filled, dec!(150));
        assert_eq!(fill.total_cost, dec!(75.5));
        assert_eq!(fill.best_price, dec!(0.50));
        assert_eq!(fill.worst_price, dec!(0.51));
        assert!(fill.sufficient_depth);
    }

    #[test]
    fn simulate_fill_buy_all_levels() {
        let book = create_test_orderbook();
        let fill = simulate_fill(&book, Side::Buy, dec!(600)).unwrap();

        assert_eq!(fill.filled, dec!(600));
        assert_eq!(fill.total_cost, dec!(308));
        assert_eq!(fill.worst_price, dec!(0.52));
        assert!(fill.sufficient_depth);
    }

    #[test]
    fn simulate_fill_buy_insufficient_depth() {
        let book = create_test_orderbook();
        let fill = simulate_fill(&book, Side::Buy, dec!(700)).unwrap();

        assert_eq!(fill.filled, dec!(600));
        assert!(!fill.sufficient_depth);
    }

    #[test]
    fn simulate_fill_sell_single_level() {
        let book = create_test_orderbook();
        let fill = simulate_fill(&book, Side::Sell, dec!(50)).unwrap();

        assert_eq!(fill.filled, dec!(50));
        assert_eq!(fill.total_cost, dec!(24));
        assert_eq!(fill.vwap, dec!(0.48));
        assert!(fill.sufficient_depth);
    }

    #[test]
    fn simulate_fill_sell_multiple_levels() {
        let book = create_test_orderbook();
        let fill = simulate_fill(&book, Side::Sell, dec!(200)).unwrap();

        assert_eq!(fill.filled, dec!(200));
        assert_eq!(fill.total_cost, dec!(95));
        assert_eq!(fill.best_price, dec!(0.48));
        assert_eq!(fill.worst_price, dec!(0.47));
    }

    #[test]
    fn simulate_fill_zero_or_negative_size() {
        let book = create_test_orderbook();
        assert!(simulate_fill(&book, Side::Buy, Decimal::ZERO).is_none());
        assert!(simulate_fill(&book, Side::Buy, dec!(-10)).is_none());
    }

    #[test]
    fn simulate_fill_empty_book() {
        let book = OrderBook::new("empty", 0);
        assert!(simulate_fill(&book, Side::Buy, dec!(100)).is_none());
        assert!(simulate_fill(&book, Side::Sell, dec!(100)).is_none());
    }

    #[test]
    fn depth_at_price_buy_and_sell() {
        let book = create_test_orderbook();
        assert_eq!(depth_at_price(&book, Side::Buy, dec!(0.50)), dec!(100));
        assert_eq!(depth_at_price(&book, Side::Buy, dec!(0.51)), dec!(300));
        assert_eq!(depth_at_price(&book, Side::Sell, dec!(0.48)), dec!(100));
        assert_eq!(depth_at_price(&book, Side::Sell, dec!(0.47)), dec!(300));
    }

    #[test]
    fn price_impact_small_vs_crossing_order() {
        let book = create_test_orderbook();
        assert_eq!(
            price_impact(&book, Side::Buy, dec!(50)),
            Some(Decimal::ZERO)
        );
        assert_eq!(price_impact(&book, Side::Buy, dec!(150)), Some(dec!(0.01)));
        assert!(price_impact(&book, Side::Buy, dec!(1000)).is_none());
    }

    #[test]
    fn vwap_calculation() {
        let book = create_test_orderbook();
        let fill = simulate_fill(&book, Side::Buy, dec!(300)).unwrap();
        let expected_vwap = dec!(152) / dec!(300);
        assert_eq!(fill.vwap, expected_vwap);
    }
}
