//! Customer notifications
//!
//! Notifications are best effort. Services hand a [`NotificationEvent`] to the
//! [`NotificationDispatcher`], which queues it and returns immediately; a
//! background task delivers it through a [`Notifier`] and logs failures.

mod logging;
mod webhook;

pub use logging::LogNotifier;
pub use webhook::WebhookNotifier;

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::Order;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail service rejected notification: HTTP {0}")]
    Rejected(u16),

    #[error("Order {0} has no customer email")]
    NoRecipient(String),
}

/// Outbound mail collaborator
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_order_confirmation(&self, order: &Order) -> Result<(), NotifyError>;

    async fn send_completion_notice(&self, order: &Order) -> Result<(), NotifyError>;

    async fn send_price_revision(
        &self,
        order: &Order,
        old_price: Decimal,
        new_price: Decimal,
        reason: &str,
    ) -> Result<(), NotifyError>;
}

/// Queued notification
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    OrderConfirmation(Order),
    CompletionNotice(Order),
    PriceRevision {
        order: Order,
        old_price: Decimal,
        new_price: Decimal,
        reason: String,
    },
}

impl NotificationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OrderConfirmation(_) => "order_confirmation",
            Self::CompletionNotice(_) => "completion_notice",
            Self::PriceRevision { .. } => "price_revision",
        }
    }

    pub fn order(&self) -> &Order {
        match self {
            Self::OrderConfirmation(order)
            | Self::CompletionNotice(order)
            | Self::PriceRevision { order, .. } => order,
        }
    }

    async fn deliver(&self, notifier: &dyn Notifier) -> Result<(), NotifyError> {
        match self {
            Self::OrderConfirmation(order) => notifier.send_order_confirmation(order).await,
            Self::CompletionNotice(order) => notifier.send_completion_notice(order).await,
            Self::PriceRevision {
                order,
                old_price,
                new_price,
                reason,
            } => {
                notifier
                    .send_price_revision(order, *old_price, *new_price, reason)
                    .await
            }
        }
    }
}

/// Non-blocking handle onto the notification queue
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<NotificationEvent>,
}

impl NotificationDispatcher {
    /// Start the delivery task; it stops once every dispatcher clone is dropped
    pub fn spawn(notifier: Arc<dyn Notifier>, buffer_size: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        let handle = tokio::spawn(run_delivery(notifier, rx));
        (Self { tx }, handle)
    }

    /// Queue an event. Never blocks, never fails the caller.
    pub fn dispatch(&self, event: NotificationEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::warn!(
                    kind = event.kind(),
                    order_number = %event.order().order_number,
                    "Notification queue full, dropping notification"
                );
            }
            Err(TrySendError::Closed(event)) => {
                tracing::error!(
                    kind = event.kind(),
                    order_number = %event.order().order_number,
                    "Notification worker stopped, dropping notification"
                );
            }
        }
    }
}

async fn run_delivery(notifier: Arc<dyn Notifier>, mut rx: mpsc::Receiver<NotificationEvent>) {
    tracing::info!("Notification worker started");

    while let Some(event) = rx.recv().await {
        match event.deliver(notifier.as_ref()).await {
            Ok(()) => tracing::debug!(
                kind = event.kind(),
                order_number = %event.order().order_number,
                "Notification delivered"
            ),
            Err(e) => tracing::warn!(
                kind = event.kind(),
                order_number = %event.order().order_number,
                error = %e,
                "Notification failed"
            ),
        }
    }

    tracing::info!("Notification channel closed, worker stopping");
}
