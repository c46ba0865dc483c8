//! The exchange boundary trait and its in-memory test double.
//!
//! Concrete HTTP/WS/signing implementations live outside this crate; only
//! the trait contract and [`PaperExchangeClient`] are in-core. Call-sites,
//! not trait impls, are responsible for routing every call through a rate
//! limiter, circuit breaker, and retrier.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;

use super::types::{Order, OrderBook, OrderStatus, Side};

#[derive(Debug, Clone, Error)]
pub enum ExchangeError {
    #[error("transient exchange error: {0}")]
    Transient(String),
    #[error("fatal exchange error: {0}")]
    Fatal(String),
}

impl ExchangeError {
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, ExchangeError::Transient(_))
    }
}

/// The exchange-agnostic boundary every concrete exchange adapter implements.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Fetches the current order book. `Transient` on network failure,
    /// `Fatal` on any 4xx other than 429.
    async fn get_order_book(&self, token_id: &str) -> Result<OrderBook, ExchangeError>;

    /// Places an order. `price` must already be tick-rounded in the trade
    /// direction by the caller. Costs 2 rate-limit tokens at the call-site.
    async fn place_order(
        &self,
        token_id: &str,
        side: Side,
        price: Decimal,
        size: Decimal,
    ) -> Result<Order, ExchangeError>;

    /// Cancels an order. Non-existence is treated as success by implementations.
    async fn cancel_order(&self, order_id: &str) -> Result<(), ExchangeError>;

    /// Returns the authoritative order state, or `None` if unknown (NOT
    /// the same as cancelled).
    async fn get_order_status(&self, order_id: &str) -> Result<Option<Order>, ExchangeError>;

    /// Current available balance, in quote-currency units.
    async fn get_balance(&self) -> Result<Decimal, ExchangeError>;

    /// Best-effort bulk cancel, used on shutdown.
    async fn cancel_all_open_orders(&self) -> Result<(), ExchangeError>;
}

/// In-memory exchange double for dry/paper runs and tests. Fills are
/// immediate and unconditional: every placed order is marked `Filled` at
/// its requested size.
pub struct PaperExchangeClient {
    books: RwLock<HashMap<String, OrderBook>>,
    orders: RwLock<HashMap<String, Order>>,
    balance: RwLock<Decimal>,
    next_id: RwLock<u64>,
}

impl PaperExchangeClient {
    #[must_use]
    pub fn new(starting_balance: Decimal) -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
            orders: RwLock::new(HashMap::new()),
            balance: RwLock::new(starting_balance),
            next_id: RwLock::new(1),
        }
    }

    pub fn seed_book(&self, book: OrderBook) {
        self.books.write().insert(book.token_id.clone(), book);
    }
}

#[async_trait]
impl ExchangeClient for PaperExchangeClient {
    async fn get_order_book(&self, token_id: &str) -> Result<OrderBook, ExchangeError> {
        self.books
            .read()
            .get(token_id)
            .cloned()
            .ok_or_else(|| ExchangeError::Fatal(format!("no book seeded for {token_id}")))
    }

    async fn place_order(
        &self,
        token_id: &str,
        side: Side,
        price: Decimal,
        size: Decimal,
    ) -> Result<Order, ExchangeError> {
        let mut next_id = self.next_id.write();
        let id = format!("paper-{}", *next_id);
        *next_id += 1;
        let now = Utc::now();
        let order = Order {
            id: id.clone(),
            token_id: token_id.to_string(),
            side,
            price,
            size,
            filled_size: size,
            status: OrderStatus::Filled,
            created_at: now,
            updated_at: now,
        };
        self.orders.write().insert(id, order.clone());
        Ok(order)
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), ExchangeError> {
        if let Some(order) = self.orders.write().get_mut(order_id) {
            order.status = OrderStatus::Cancelled;
        }
        Ok(())
    }

    async fn get_order_status(&self, order_id: &str) -> Result<Option<Order>, ExchangeError> {
        Ok(self.orders.read().get(order_id).cloned())
    }

    async fn get_balance(&self) -> Result<Decimal, ExchangeError> {
        Ok(*self.balance.read())
    }

    async fn cancel_all_open_orders(&self) -> Result<(), ExchangeError> {
        for order in self.orders.write().values_mut() {
            if !order.status.is_terminal() {
                order.status = OrderStatus::Cancelled;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn paper_client_fills_orders_immediately() {
        let client = PaperExchangeClient::new(dec!(1000));
        let order = client
            .place_order("tok", Side::Buy, dec!(0.5), dec!(100))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.filled_size, dec!(100));
    }

    #[tokio::test]
    async fn paper_client_reports_seeded_book() {
        let client = PaperExchangeClient::new(dec!(1000));
        client.seed_book(OrderBook::new("tok", 0));
        assert!(client.get_order_book("tok").await.is_ok());
        assert!(client.get_order_book("missing").await.is_err());
    }

    #[tokio::test]
    async fn cancel_marks_order_cancelled() {
        let client = PaperExchangeClient::new(dec!(1000));
        let order = client
            .place_order("tok", Side::Buy, dec!(0.5), dec!(10))
            .await
            .unwrap();
        // Filled orders are terminal so cancel is a no-op here, matching
        // "non-existence / already-terminal is success".
        client.cancel_order(&order.id).await.unwrap();
        let status = client.get_order_status(&order.id).await.unwrap();
        assert_eq!(status.unwrap().status, OrderStatus::Filled);
    }

    #[tokio::test]
    async fn unknown_order_status_is_none_not_cancelled() {
        let client = PaperExchangeClient::new(dec!(1000));
        assert!(client.get_order_status("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn balance_reports_seeded_amount() {
        let client = PaperExchangeClient::new(dec!(500));
        assert_eq!(client.get_balance().await.unwrap(), dec!(500));
    }
}
