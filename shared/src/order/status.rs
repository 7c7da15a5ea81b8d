//! Order lifecycle state machine
//!
//! ```text
//! RECEIVED → PACK_SENT → DEVICE_RECEIVED → INSPECTION_PASSED → PAYOUT_READY → PAID → CLOSED
//!                                       ↘ INSPECTION_FAILED ─┬→ PRICE_REVISED ─┘
//!                                                             └→ CLOSED
//! CANCELLED is reachable from every non-financial state and is terminal.
//! ```
//!
//! The transition table is the single source of truth: every status write
//! (single-field update or full-order update) goes through
//! [`OrderStatus::can_transition`]. Payment status is never stored, it is
//! derived from the status by [`OrderStatus::payment_status`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Received,
    PackSent,
    DeviceReceived,
    InspectionPassed,
    InspectionFailed,
    PriceRevised,
    PayoutReady,
    Paid,
    Closed,
    Cancelled,
}

/// Payout state derived from [`OrderStatus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl OrderStatus {
    /// Every status, in lifecycle order
    pub const ALL: [OrderStatus; 10] = [
        OrderStatus::Received,
        OrderStatus::PackSent,
        OrderStatus::DeviceReceived,
        OrderStatus::InspectionPassed,
        OrderStatus::InspectionFailed,
        OrderStatus::PriceRevised,
        OrderStatus::PayoutReady,
        OrderStatus::Paid,
        OrderStatus::Closed,
        OrderStatus::Cancelled,
    ];

    /// Entry state of the workflow
    pub const INITIAL: OrderStatus = OrderStatus::Received;

    /// Statuses reachable in one step from `self`
    pub const fn allowed_targets(self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Received => &[PackSent, Cancelled],
            PackSent => &[DeviceReceived, Cancelled],
            DeviceReceived => &[InspectionPassed, InspectionFailed, Cancelled],
            InspectionPassed => &[PayoutReady, PriceRevised],
            InspectionFailed => &[PriceRevised, Cancelled, Closed],
            PriceRevised => &[PayoutReady, Cancelled],
            PayoutReady => &[Paid],
            Paid => &[Closed],
            Closed | Cancelled => &[],
        }
    }

    /// Whether `from → to` is a legal single-step transition
    pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
        from.allowed_targets().contains(&to)
    }

    /// Paid/completed class: the payout has been made
    ///
    /// `CLOSED` counts as completed because the regular closing path runs
    /// through `PAID`.
    pub fn is_paid_class(self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Closed)
    }

    /// Derived payment status
    pub fn payment_status(self) -> PaymentStatus {
        if self.is_paid_class() {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Pending
        }
    }

    /// Wire name (`PACK_SENT`, ...)
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Received => "RECEIVED",
            OrderStatus::PackSent => "PACK_SENT",
            OrderStatus::DeviceReceived => "DEVICE_RECEIVED",
            OrderStatus::InspectionPassed => "INSPECTION_PASSED",
            OrderStatus::InspectionFailed => "INSPECTION_FAILED",
            OrderStatus::PriceRevised => "PRICE_REVISED",
            OrderStatus::PayoutReady => "PAYOUT_READY",
            OrderStatus::Paid => "PAID",
            OrderStatus::Closed => "CLOSED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown status name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl PaymentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;
    use super::*;

    const TABLE: &[(OrderStatus, &[OrderStatus])] = &[
        (Received, &[PackSent, Cancelled]),
        (PackSent, &[DeviceReceived, Cancelled]),
        (DeviceReceived, &[InspectionPassed, InspectionFailed, Cancelled]),
        (InspectionPassed, &[PayoutReady, PriceRevised]),
        (InspectionFailed, &[PriceRevised, Cancelled, Closed]),
        (PriceRevised, &[PayoutReady, Cancelled]),
        (PayoutReady, &[Paid]),
        (Paid, &[Closed]),
        (Closed, &[]),
        (Cancelled, &[]),
    ];

    #[test]
    fn test_every_pair_matches_table() {
        for (from, allowed) in TABLE {
            for to in OrderStatus::ALL {
                assert_eq!(
                    OrderStatus::can_transition(*from, to),
                    allowed.contains(&to),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_self_transition_is_not_in_table() {
        for status in OrderStatus::ALL {
            assert!(!OrderStatus::can_transition(status, status));
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(Closed.allowed_targets().is_empty());
        assert!(Cancelled.allowed_targets().is_empty());
        assert!(!Paid.allowed_targets().is_empty());
        assert!(!Received.allowed_targets().is_empty());
    }

    #[test]
    fn test_payment_status_derivation() {
        for status in OrderStatus::ALL {
            let expected = if matches!(status, Paid | Closed) {
                PaymentStatus::Paid
            } else {
                PaymentStatus::Pending
            };
            assert_eq!(status.payment_status(), expected, "{status}");
        }
    }

    #[test]
    fn test_wire_names_roundtrip() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_happy_path_is_reachable() {
        let path = [
            Received,
            PackSent,
            DeviceReceived,
            InspectionPassed,
            PayoutReady,
            Paid,
            Closed,
        ];
        for pair in path.windows(2) {
            assert!(OrderStatus::can_transition(pair[0], pair[1]));
        }
    }
}
