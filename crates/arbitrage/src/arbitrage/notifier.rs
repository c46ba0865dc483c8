//! Outbound notification of fills and exits to an external collaborator
//! (chat webhook, email, metrics sink — concrete transports live outside
//! this crate).

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::types::Opportunity;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_executed(&self, opp: &Opportunity);
    async fn notify_exit(&self, trade_id: &str, reason: &str, pnl: Decimal);
    async fn notify_refused(&self, market_name: &str, reason: &str);
}

/// No-op default used in tests and when no outbound collaborator is configured.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify_executed(&self, _opp: &Opportunity) {}
    async fn notify_exit(&self, _trade_id: &str, _reason: &str, _pnl: Decimal) {}
    async fn notify_refused(&self, _market_name: &str, _reason: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn null_notifier_accepts_every_call() {
        let notifier = NullNotifier;
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
        notifier.notify_executed(&opp).await;
        notifier.notify_exit("t", "trailing_stop", dec!(-1)).await;
        notifier.notify_refused("m", "safe mode").await;
    }
}
