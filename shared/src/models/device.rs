//! Device catalog model

use serde::{Deserialize, Serialize};

/// Device catalog entry
///
/// Maintained by staff tooling; read-only to the order core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub brand: String,
    pub model: String,
    /// Canonical display name, e.g. "Apple iPhone 16" (matched exactly on ingestion)
    pub full_name: String,
    pub category: String,
    pub is_active: bool,
}
