//! Unwinds a stranded filled leg by selling it back at the best bid.

use rust_decimal::Decimal;

use super::exchange_client::ExchangeClient;
use super::price_math::round_down;
use super::resilience::{Resilience, PLACE_ORDER_TOKENS};
use super::types::{OrderBook, Side};

/// Outcome of a hedge attempt.
#[derive(Debug, Clone, Copy)]
pub struct HedgeResult {
    pub success: bool,
    pub price: Decimal,
    pub size: Decimal,
    /// `size * (entryPrice - bidPrice)`, clamped to zero on failure — a
    /// failed hedge books no loss here, it stays an open stranded position.
    pub loss_usd: Decimal,
}

/// Sells `size` of `token_id` at `roundDown(bestBid)`. Returns `success: false`
/// with `loss_usd = 0` if there's no bid to hedge against or placement fails.
pub async fn hedge(
    client: &dyn ExchangeClient,
    resilience: &Resilience,
    token_id: &str,
    size: Decimal,
    entry_price: Decimal,
    book: &OrderBook,
) -> HedgeResult {
    let Some(best_bid) = book.best_bid() else {
        return HedgeResult {
            success: false,
            price: Decimal::ZERO,
            size: Decimal::ZERO,
            loss_usd: Decimal::ZERO,
        };
    };
    let hedge_price = round_down(best_bid);

    let placed = resilience
        .call(PLACE_ORDER_TOKENS, || {
            client.place_order(token_id, Side::Sell, hedge_price, size)
        })
        .await;

    match placed {
        Ok(order) => HedgeResult {
            success: true,
            price: hedge_price,
            size: order.filled_size,
            loss_usd: (size * (entry_price - hedge_price)).max(Decimal::ZERO),
        },
        Err(_) => HedgeResult {
            success: false,
            price: Decimal::ZERO,
            size: Decimal::ZERO,
            loss_usd: Decimal::ZERO,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrage::exchange_client::PaperExchangeClient;
    use crate::arbitrage::resilience::{Resilience, ResilienceConfig};
    use rust_decimal_macros::dec;

    fn book_with_bid(bid: Decimal) -> OrderBook {
        let mut b = OrderBook::new("tok", 0);
        b.apply_snapshot(vec![(bid, dec!(1000))], vec![], 0);
        b
    }

    #[tokio::test]
    async fn hedges_at_rounded_best_bid() {
        let client = PaperExchangeClient::new(dec!(1000));
        let resilience = Resilience::new(ResilienceConfig::default());
        let book = book_with_bid(dec!(0.439));
        let result = hedge(&client, &resilience, "tok", dec!(100), dec!(0.47), &book).await;
        assert!(result.success);
        assert_eq!(result.price, dec!(0.43));
    }

    #[tokio::test]
    async fn loss_matches_entry_minus_bid_times_size() {
        let client = PaperExchangeClient::new(dec!(1000));
        let resilience = Resilience::new(ResilienceConfig::default());
        let book = book_with_bid(dec!(0.40));
        let result = hedge(&client, &resilience, "tok", dec!(100), dec!(0.47), &book).await;
        assert_eq!(result.loss_usd, dec!(7));
    }

    #[tokio::test]
    async fn no_bid_fails_with_zero_loss() {
        let client = PaperExchangeClient::new(dec!(1000));
        let resilience = Resilience::new(ResilienceConfig::default());
        let book = OrderBook::new("tok", 0);
        let result = hedge(&client, &resilience, "tok", dec!(100), dec!(0.47), &book).await;
        assert!(!result.success);
        assert_eq!(result.loss_usd, Decimal::ZERO);
    }
}
