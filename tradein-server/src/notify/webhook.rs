//! Notifier that forwards events to the mail service over HTTP

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::Order;

use super::{Notifier, NotifyError};

/// Body posted to the mail service. Payout details are never included.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    event: &'a str,
    order_number: &'a str,
    customer_name: &'a str,
    customer_email: &'a str,
    device_name: &'a str,
    grade: &'a str,
    offered_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    old_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

impl<'a> WebhookPayload<'a> {
    fn for_order(event: &'a str, order: &'a Order, email: &'a str) -> Self {
        Self {
            event,
            order_number: &order.order_number,
            customer_name: &order.customer.name,
            customer_email: email,
            device_name: &order.device.name,
            grade: order.device.grade.as_str(),
            offered_price: order.offered_price,
            amount: None,
            old_price: None,
            new_price: None,
            reason: None,
        }
    }
}

/// Upper bound on one delivery, connect included
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        Self::with_timeout(url, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn post(&self, payload: &WebhookPayload<'_>) -> Result<(), NotifyError> {
        let resp = self.client.post(&self.url).json(payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }
        tracing::info!(
            event = payload.event,
            order_number = payload.order_number,
            "Notification forwarded to mail service"
        );
        Ok(())
    }
}

fn recipient(order: &Order) -> Result<&str, NotifyError> {
    order
        .customer
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| NotifyError::NoRecipient(order.order_number.clone()))
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_order_confirmation(&self, order: &Order) -> Result<(), NotifyError> {
        let email = recipient(order)?;
        self.post(&WebhookPayload::for_order("order_confirmation", order, email))
            .await
    }

    async fn send_completion_notice(&self, order: &Order) -> Result<(), NotifyError> {
        let email = recipient(order)?;
        let payload = WebhookPayload {
            amount: Some(order.effective_price()),
            ..WebhookPayload::for_order("completion_notice", order, email)
        };
        self.post(&payload).await
    }

    async fn send_price_revision(
        &self,
        order: &Order,
        old_price: Decimal,
        new_price: Decimal,
        reason: &str,
    ) -> Result<(), NotifyError> {
        let email = recipient(order)?;
        let payload = WebhookPayload {
            old_price: Some(old_price),
            new_price: Some(new_price),
            reason: Some(reason),
            ..WebhookPayload::for_order("price_revision", order, email)
        };
        self.post(&payload).await
    }
}
