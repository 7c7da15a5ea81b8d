//! External order ingestion gateway

pub mod order_number;
pub mod payload;
pub mod service;

pub use order_number::{DailySequence, OrderNumberGenerator, RandomSuffix, build_generator};
pub use payload::{ExternalOrderPayload, ValidatedPayload};
pub use service::{ExternalOrderCreated, IngestRequest, IngestionService};
