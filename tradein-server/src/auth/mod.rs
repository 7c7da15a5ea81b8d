//! Request authentication
//!
//! - External gateway: source-address whitelist ([`access_gate`])
//! - Staff API: bearer admin token ([`admin_auth`])

pub mod access_gate;
pub mod admin_auth;

pub use access_gate::{AccessDecision, AccessGate, ClientIp, access_gate_middleware, client_ip};
pub use admin_auth::admin_auth_middleware;
