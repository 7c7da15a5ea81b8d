//! tradein-server: order backbone of the device trade-in platform
//!
//! - Partner order ingestion behind a source-address whitelist, with an
//!   audit row per attempt
//! - Order lifecycle state machine with derived payment status
//! - Pricing engine: quotes, bulk repricing, gap detection, cloning, reports
//! - Staff API guarded by an admin token

pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod notify;
pub mod orders;
pub mod pricing;
pub mod state;

pub use config::Config;
pub use state::{AppState, BackgroundTasks};
