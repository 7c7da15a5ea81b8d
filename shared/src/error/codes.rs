//! Unified error codes for the trade-in platform
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Access errors
//! - 4xxx: Order errors
//! - 6xxx: Catalog errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (partner integrations, dashboard).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format (e.g. malformed JSON body)
    InvalidFormat = 6,
    /// One or more required fields are missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Access ====================
    /// Caller is not authenticated (staff routes)
    NotAuthenticated = 1001,
    /// Source address is not whitelisted
    AccessDenied = 1002,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Requested status is not reachable from the current status
    InvalidStatusTransition = 4002,
    /// Order number collided with an existing order
    OrderNumberConflict = 4003,
    /// Final price below offered price without a revision reason
    PriceRevisionReasonRequired = 4004,
    /// Postage method is not one of the supported values
    InvalidPostageMethod = 4005,

    // ==================== 6xxx: Catalog ====================
    /// Device not found (or inactive)
    DeviceNotFound = 6001,
    /// No pricing entry for the requested combination
    PricingNotFound = 6002,
    /// Network/storage combination has no configured price
    PricingCombinationInvalid = 6003,
    /// Grade is not one of NEW, GOOD, BROKEN
    InvalidGrade = 6004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
}

/// Error returned when converting an unknown u16 into [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Access
            ErrorCode::NotAuthenticated => "Authentication required",
            ErrorCode::AccessDenied => "Access denied",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidStatusTransition => "Invalid status transition",
            ErrorCode::OrderNumberConflict => "Order number already in use",
            ErrorCode::PriceRevisionReasonRequired => {
                "A revision reason is required when lowering the price"
            }
            ErrorCode::InvalidPostageMethod => "Invalid postage method",

            // Catalog
            ErrorCode::DeviceNotFound => "Device not found",
            ErrorCode::PricingNotFound => "Pricing not found",
            ErrorCode::PricingCombinationInvalid => "Invalid network/storage combination",
            ErrorCode::InvalidGrade => "Invalid device grade",

            // System
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Access
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::AccessDenied),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::InvalidStatusTransition),
            4003 => Ok(ErrorCode::OrderNumberConflict),
            4004 => Ok(ErrorCode::PriceRevisionReasonRequired),
            4005 => Ok(ErrorCode::InvalidPostageMethod),

            // Catalog
            6001 => Ok(ErrorCode::DeviceNotFound),
            6002 => Ok(ErrorCode::PricingNotFound),
            6003 => Ok(ErrorCode::PricingCombinationInvalid),
            6004 => Ok(ErrorCode::InvalidGrade),

            // System
            9001 => Ok(ErrorCode::InternalError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::RequiredField.code(), 7);
        assert_eq!(ErrorCode::AccessDenied.code(), 1002);
        assert_eq!(ErrorCode::InvalidStatusTransition.code(), 4002);
        assert_eq!(ErrorCode::PricingCombinationInvalid.code(), 6003);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(2), Ok(ErrorCode::ValidationFailed));
        assert_eq!(ErrorCode::try_from(1002), Ok(ErrorCode::AccessDenied));
        assert_eq!(ErrorCode::try_from(4001), Ok(ErrorCode::OrderNotFound));
        assert_eq!(ErrorCode::try_from(6001), Ok(ErrorCode::DeviceNotFound));
        assert_eq!(ErrorCode::try_from(9001), Ok(ErrorCode::InternalError));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(0), Err(InvalidErrorCode(0)));
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
    }

    #[test]
    fn test_serialize() {
        assert_eq!(serde_json::to_string(&ErrorCode::NotFound).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&ErrorCode::DeviceNotFound).unwrap(),
            "6001"
        );
    }

    #[test]
    fn test_deserialize_invalid() {
        let result: Result<ErrorCode, _> = serde_json::from_str("999");
        assert!(result.is_err());
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::NotFound.message(), "Resource not found");
        assert_eq!(ErrorCode::AccessDenied.message(), "Access denied");
        assert_eq!(ErrorCode::InternalError.message(), "Internal server error");
    }

    #[test]
    fn test_invalid_error_code_display() {
        assert_eq!(
            format!("{}", InvalidErrorCode(999)),
            "invalid error code: 999"
        );
    }
}
