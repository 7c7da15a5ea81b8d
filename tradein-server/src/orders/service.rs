//! Order status and field updates
//!
//! Both write paths, the status-only update and the full update, go through
//! [`OrderService::apply_status`], so the transition table and the
//! completion notification behave identically.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{MAX_PRICE, Order, PRICE_SCALE, is_storable_price};
use shared::order::OrderStatus;
use shared::util::now_millis;

use crate::db::OrderStore;
use crate::error::ServiceResult;
use crate::notify::{NotificationDispatcher, NotificationEvent};

/// Full-order update; absent fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderUpdate {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    pub status: Option<OrderStatus>,
    pub final_price: Option<Decimal>,
    pub price_revision_reason: Option<String>,
    pub notes: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub sort_code: Option<String>,
    pub transaction_id: Option<String>,
}

pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    notifier: NotificationDispatcher,
}

/// Side effects produced while applying an update
#[derive(Default)]
struct Effects {
    entered_paid: bool,
    price_revision: Option<(Decimal, Decimal, String)>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderStore>, notifier: NotificationDispatcher) -> Self {
        Self { orders, notifier }
    }

    pub async fn get(&self, order_number: &str) -> ServiceResult<Order> {
        self.orders
            .find_by_number(order_number)
            .await?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::OrderNotFound,
                    format!("Order {order_number} not found"),
                )
                .into()
            })
    }

    /// Newest first
    pub async fn list(&self, limit: i64, offset: i64) -> ServiceResult<Vec<Order>> {
        Ok(self.orders.list_recent(limit, offset).await?)
    }

    /// Validate and apply a status change in memory.
    ///
    /// Re-setting the current status is accepted and changes nothing.
    fn apply_status(order: &mut Order, to: OrderStatus, effects: &mut Effects) -> ServiceResult<()> {
        let from = order.status;
        if from == to {
            return Ok(());
        }
        if !OrderStatus::can_transition(from, to) {
            return Err(AppError::invalid_transition(from.as_str(), to.as_str()).into());
        }
        order.status = to;
        effects.entered_paid = to == OrderStatus::Paid;
        Ok(())
    }

    /// Single-field status update
    pub async fn update_status(&self, order_number: &str, to: OrderStatus) -> ServiceResult<Order> {
        let mut order = self.get(order_number).await?;
        if order.status == to {
            return Ok(order);
        }

        let mut effects = Effects::default();
        let from = order.status;
        Self::apply_status(&mut order, to, &mut effects)?;
        order.updated_at = now_millis();
        self.orders.update(&order).await?;

        tracing::info!(
            order_number = %order.order_number,
            from = %from,
            to = %to,
            payment_status = order.payment_status().as_str(),
            "Order status updated"
        );
        self.dispatch_effects(&order, effects);
        Ok(order)
    }

    /// Full-order update
    pub async fn update_order(&self, order_number: &str, update: OrderUpdate) -> ServiceResult<Order> {
        let mut order = self.get(order_number).await?;
        let mut effects = Effects::default();
        let from = order.status;

        if let Some(to) = update.status {
            Self::apply_status(&mut order, to, &mut effects)?;
        }

        if let Some(name) = non_blank(update.customer_name) {
            order.customer.name = name;
        }
        if let Some(phone) = non_blank(update.customer_phone) {
            order.customer.phone = phone;
        }
        if let Some(address) = non_blank(update.customer_address) {
            order.customer.address = address;
        }
        if update.customer_email.is_some() {
            order.customer.email = non_blank(update.customer_email);
        }
        if update.notes.is_some() {
            order.notes = non_blank(update.notes);
        }
        if update.transaction_id.is_some() {
            order.transaction_id = non_blank(update.transaction_id);
        }
        if update.bank_name.is_some() {
            order.payout.bank_name = non_blank(update.bank_name);
        }
        if update.account_number.is_some() {
            order.payout.account_number = non_blank(update.account_number);
        }
        if update.sort_code.is_some() {
            order.payout.sort_code = non_blank(update.sort_code);
        }

        let reason = non_blank(update.price_revision_reason);
        if reason.is_some() {
            order.price_revision_reason = reason;
        }

        if let Some(new_price) = update.final_price {
            if !is_storable_price(new_price) {
                return Err(AppError::with_message(
                    ErrorCode::ValueOutOfRange,
                    format!(
                        "final_price must be between 0 and {MAX_PRICE} with at most {PRICE_SCALE} decimal places"
                    ),
                )
                .with_detail("final_price", new_price.to_string())
                .into());
            }
            let old_price = order.effective_price();
            order.final_price = Some(new_price);

            if new_price < order.offered_price {
                let reason = order.price_revision_reason.clone().ok_or_else(|| {
                    AppError::new(ErrorCode::PriceRevisionReasonRequired)
                        .with_detail("offered_price", order.offered_price.to_string())
                        .with_detail("final_price", new_price.to_string())
                })?;
                if new_price != old_price {
                    effects.price_revision = Some((old_price, new_price, reason));
                }
            }
        }

        order.updated_at = now_millis();
        self.orders.update(&order).await?;

        tracing::info!(
            order_number = %order.order_number,
            from = %from,
            to = %order.status,
            payment_status = order.payment_status().as_str(),
            "Order updated"
        );
        self.dispatch_effects(&order, effects);
        Ok(order)
    }

    fn dispatch_effects(&self, order: &Order, effects: Effects) {
        if effects.entered_paid {
            self.notifier
                .dispatch(NotificationEvent::CompletionNotice(order.clone()));
        }
        if let Some((old_price, new_price, reason)) = effects.price_revision {
            self.notifier.dispatch(NotificationEvent::PriceRevision {
                order: order.clone(),
                old_price,
                new_price,
                reason,
            });
        }
    }
}
