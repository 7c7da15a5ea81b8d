//! Order aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::pricing::Grade;
use crate::order::{OrderOrigin, OrderStatus, PaymentStatus, PayoutDetails, PostageMethod};

/// Customer contact fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
}

/// Device details copied at creation time
///
/// A snapshot, not a catalog reference: later catalog edits never rewrite
/// historical orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub name: String,
    pub network: String,
    pub grade: Grade,
    pub storage: String,
}

/// Trade-in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Internal identifier
    pub id: i64,
    /// Customer-facing business key, immutable
    pub order_number: String,
    pub origin: OrderOrigin,
    pub status: OrderStatus,
    pub customer: CustomerContact,
    pub device: DeviceSnapshot,
    pub offered_price: Decimal,
    pub final_price: Option<Decimal>,
    pub postage_method: PostageMethod,
    pub payout: PayoutDetails,
    pub transaction_id: Option<String>,
    pub price_revision_reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    pub fn payment_status(&self) -> PaymentStatus {
        self.status.payment_status()
    }

    /// Final price if set, otherwise the offered price
    pub fn effective_price(&self) -> Decimal {
        self.final_price.unwrap_or(self.offered_price)
    }
}

/// Order as returned by the API, with the derived payment status
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub payment_status: PaymentStatus,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let payment_status = order.payment_status();
        Self {
            order,
            payment_status,
        }
    }
}
