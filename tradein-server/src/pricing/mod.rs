//! Pricing resolution engine
//!
//! Quotes, bulk repricing, gap detection, cloning and reporting over the
//! pricing catalog.

mod engine;
mod report;

pub use engine::{BulkAdjustResult, CloneResult, PricingEngine, PricingGap, Quote};
pub use report::{GradeRange, NetworkCount, PricingStatistics, TopPayer};
