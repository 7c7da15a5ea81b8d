//! Data models
//!
//! Shared between the server and its clients (partner integrations, staff
//! dashboard). All internal IDs are `i64`; timestamps are Unix millis.

pub mod api_log;
pub mod device;
pub mod order;
pub mod pricing;
pub mod whitelist;

// Re-exports
pub use api_log::*;
pub use device::*;
pub use order::*;
pub use pricing::*;
pub use whitelist::*;
