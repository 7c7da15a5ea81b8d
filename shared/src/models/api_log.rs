//! External API request log model

use serde::{Deserialize, Serialize};

/// One row per external request, written regardless of outcome
///
/// Append-only: never updated, only purged by age.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRequestLog {
    pub id: i64,
    /// Unix millis
    pub timestamp: i64,
    pub source_ip: Option<String>,
    pub endpoint: String,
    pub method: String,
    pub status_code: u16,
    pub success: bool,
    pub order_number: Option<String>,
    /// Inbound body as received (payout fields redacted)
    pub request_payload: Option<String>,
    pub error_message: Option<String>,
    pub response_time_ms: i64,
}
