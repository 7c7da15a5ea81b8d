//! Unified error system for the trade-in platform
//!
//! This module provides the error handling system shared by every crate:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ApiResponse`]: Error envelope returned by failing endpoints
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Access errors
//! - 4xxx: Order errors
//! - 6xxx: Catalog errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::new(ErrorCode::DeviceNotFound);
//!
//! let err = AppError::missing_fields(&["customer_name", "network"]);
//! assert_eq!(err.code, ErrorCode::RequiredField);
//!
//! let response = ApiResponse::error(&err);
//! assert_eq!(response.code, 7);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError};
