//! Persistence boundary for trade records and config snapshots. Concrete
//! storage (a database, a file) is an external collaborator; only the
//! trait and a no-op double live in-core.

use async_trait::async_trait;

use super::types::{Opportunity, OrderStatus};

#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Inserts a new trade record. Idempotent on `trade_id`: inserting the
    /// same id twice is a no-op, not an error.
    async fn insert_trade(&self, opp: &Opportunity) -> anyhow::Result<()>;

    async fn update_trade_status(&self, trade_id: &str, status: OrderStatus) -> anyhow::Result<()>;

    async fn save_config_snapshot(&self, toml: &str) -> anyhow::Result<()>;
}

/// No-op default used in tests and when no outbound collaborator is configured.
pub struct NullTradeStore;

#[async_trait]
impl TradeStore for NullTradeStore {
    async fn insert_trade(&self, _opp: &Opportunity) -> anyhow::Result<()> {
        Ok(())
    }

    async fn update_trade_status(&self, _trade_id: &str, _status: OrderStatus) -> anyhow::Result<()> {
        Ok(())
    }

    async fn save_config_snapshot(&self, _toml: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn null_store_accepts_every_call() {
        let store = NullTradeStore;
        let opp = Opportunity::BinaryComplement {
            trade_id: "t".into(),
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
        store.insert_trade(&opp).await.unwrap();
        store
            .update_trade_status("t", OrderStatus::Filled)
            .await
            .unwrap();
        store.save_config_snapshot("key = 1").await.unwrap();
    }
}
