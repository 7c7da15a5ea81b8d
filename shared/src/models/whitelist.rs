//! IP whitelist model

use serde::{Deserialize, Serialize};

/// Source address permitted to call the external ingestion endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpWhitelistEntry {
    pub id: i64,
    /// Normalized IPv4/IPv6 literal
    pub address: String,
    pub label: String,
    pub is_active: bool,
    pub created_at: i64,
}

/// Create whitelist entry payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpWhitelistCreate {
    pub address: String,
    #[serde(default)]
    pub label: String,
}
