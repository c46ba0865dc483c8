//! Tick-aligned, arbitrary-precision price arithmetic.
//!
//! All rounding goes through `rust_decimal` so that repeated operations never
//! accumulate binary-float drift. Buy-side prices always round up, sell-side
//! prices always round down — callers must not invert this convention.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// The exchange's fixed price increment.
pub const TICK: Decimal = dec!(0.01);

/// Minimum tradeable price (probability markets never quote at exactly 0).
pub const MIN_PRICE: Decimal = dec!(0.01);

/// Maximum tradeable price (probability markets never quote at exactly 1).
pub const MAX_PRICE: Decimal = dec!(0.99);

fn clamp(price: Decimal) -> Decimal {
    price.max(MIN_PRICE).min(MAX_PRICE)
}

/// Rounds to the nearest tick, ties rounding away from zero, then clamps to range.
#[must_use]
pub fn round_nearest(price: Decimal) -> Decimal {
    let ticks = (price / TICK).round();
    clamp(ticks * TICK)
}

/// Rounds up to the next tick (or stays if already on a tick), then clamps.
///
/// Buy-side prices use this rounding direction.
#[must_use]
pub fn round_up(price: Decimal) -> Decimal {
    let ticks = (price / TICK).ceil();
    clamp(ticks * TICK)
}

/// Rounds down to the previous tick (or stays if already on a tick), then clamps.
///
/// Sell-side prices use this rounding direction.
#[must_use]
pub fn round_down(price: Decimal) -> Decimal {
    let ticks = (price / TICK).floor();
    clamp(ticks * TICK)
}

/// Shifts a price by `n` ticks (negative moves down), then clamps to range.
#[must_use]
pub fn adjust_by_ticks(price: Decimal, n: i64) -> Decimal {
    let base = round_nearest(price);
    clamp(base + TICK * Decimal::from(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_up_moves_to_next_tick() {
        assert_eq!(round_up(dec!(0.471)), dec!(0.48));
    }

    #[test]
    fn round_up_stays_on_exact_tick() {
        assert_eq!(round_up(dec!(0.47)), dec!(0.47));
    }

    #[test]
    fn round_down_moves_to_previous_tick() {
        assert_eq!(round_down(dec!(0.479)), dec!(0.47));
    }

    #[test]
    fn round_down_stays_on_exact_tick() {
        assert_eq!(round_down(dec!(0.47)), dec!(0.47));
    }

    #[test]
    fn round_nearest_rounds_to_closest_tick() {
        assert_eq!(round_nearest(dec!(0.474)), dec!(0.47));
        assert_eq!(round_nearest(dec!(0.476)), dec!(0.48));
    }

    #[test]
    fn clamps_below_min_price() {
        assert_eq!(round_up(dec!(0.001)), MIN_PRICE);
        assert_eq!(round_down(dec!(0.001)), MIN_PRICE);
    }

    #[test]
    fn clamps_above_max_price() {
        assert_eq!(round_up(dec!(0.999)), MAX_PRICE);
        assert_eq!(round_down(dec!(0.999)), MAX_PRICE);
    }

    #[test]
    fn adjust_by_ticks_moves_up_and_down() {
        assert_eq!(adjust_by_ticks(dec!(0.50), 2), dec!(0.52));
        assert_eq!(adjust_by_ticks(dec!(0.50), -2), dec!(0.48));
    }

    #[test]
    fn adjust_by_ticks_round_trips() {
        let original = dec!(0.50);
        let forward = adjust_by_ticks(original, 3);
        let back = adjust_by_ticks(forward, -3);
        assert_eq!(back, original);
    }

    #[test]
    fn round_nearest_is_idempotent() {
        let once = round_nearest(dec!(0.4739));
        let twice = round_nearest(once);
        assert_eq!(once, twice);
    }

    // invariant I1: roundUp(p) >= p >= roundDown(p), both within [MIN,MAX] and tick-aligned
    #[test]
    fn invariant_round_up_down_bracket_price() {
        for raw in [dec!(0.0001), dec!(0.333), dec!(0.5), dec!(0.9999), dec!(0.47)] {
            let up = round_up(raw);
            let down = round_down(raw);
            assert!(up >= down);
            assert!(up >= MIN_PRICE && up <= MAX_PRICE);
            assert!(down >= MIN_PRICE && down <= MAX_PRICE);
            assert_eq!((up / TICK).fract(), Decimal::ZERO);
            assert_eq!((down / TICK).fract(), Decimal::ZERO);
        }
    }
}
