//! Staff-side order management

mod service;

pub use service::{OrderService, OrderUpdate};
