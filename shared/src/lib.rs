//! Shared types for the trade-in platform
//!
//! Domain models, the order lifecycle state machine and the unified error
//! system used by the server and its clients.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};
