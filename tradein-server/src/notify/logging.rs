//! Notifier that only writes to the tracing log

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::Order;

use super::{Notifier, NotifyError};

/// Used when no mail service is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_order_confirmation(&self, order: &Order) -> Result<(), NotifyError> {
        tracing::info!(
            order_number = %order.order_number,
            device = %order.device.name,
            offered_price = %order.offered_price,
            "Order confirmation (mail service not configured)"
        );
        Ok(())
    }

    async fn send_completion_notice(&self, order: &Order) -> Result<(), NotifyError> {
        tracing::info!(
            order_number = %order.order_number,
            amount = %order.effective_price(),
            "Completion notice (mail service not configured)"
        );
        Ok(())
    }

    async fn send_price_revision(
        &self,
        order: &Order,
        old_price: Decimal,
        new_price: Decimal,
        reason: &str,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            order_number = %order.order_number,
            %old_price,
            %new_price,
            reason,
            "Price revision (mail service not configured)"
        );
        Ok(())
    }
}
