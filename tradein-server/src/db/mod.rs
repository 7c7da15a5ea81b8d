//! Database access layer
//!
//! Every store is a trait so request handlers never know which backend they
//! talk to. Production uses [`postgres::PgStore`]; development without a
//! `DATABASE_URL` and the test suite use [`memory::MemoryStore`].

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use shared::models::{
    ApiRequestLog, Device, GradePrices, IpWhitelistEntry, Order, PricingEntry,
};
use thiserror::Error;

/// Storage-layer error
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique constraint violated (order number, pricing triple, active address)
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Row could not be mapped back onto a model
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Conjunctive pricing filter; `None` fields match everything
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PricingFilter {
    pub device_id: Option<i64>,
    pub network: Option<String>,
    pub storage: Option<String>,
}

impl PricingFilter {
    pub fn for_device(device_id: i64) -> Self {
        Self {
            device_id: Some(device_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, entry: &PricingEntry) -> bool {
        self.device_id.is_none_or(|id| entry.device_id == id)
            && self.network.as_deref().is_none_or(|n| entry.network == n)
            && self.storage.as_deref().is_none_or(|s| entry.storage == s)
    }
}

/// Device and pricing catalog
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Exact, case-sensitive match on the full name among active devices
    async fn find_active_device_by_name(&self, name: &str) -> StoreResult<Option<Device>>;

    async fn find_device(&self, id: i64) -> StoreResult<Option<Device>>;

    async fn find_pricing(
        &self,
        device_id: i64,
        network: &str,
        storage: &str,
    ) -> StoreResult<Option<PricingEntry>>;

    async fn list_pricing(&self, filter: &PricingFilter) -> StoreResult<Vec<PricingEntry>>;

    /// Overwrite grade prices by entry id, returning the number of rows written
    async fn update_prices(&self, updates: &[(i64, GradePrices)], now: i64) -> StoreResult<u64>;

    /// Delete every entry of `device_id`, then insert `entries`
    async fn replace_device_pricing(
        &self,
        device_id: i64,
        entries: &[PricingEntry],
    ) -> StoreResult<u64>;
}

/// Order persistence
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] when the order number is taken
    async fn insert(&self, order: &Order) -> StoreResult<()>;

    async fn find_by_number(&self, order_number: &str) -> StoreResult<Option<Order>>;

    /// Full-row update keyed by order number
    async fn update(&self, order: &Order) -> StoreResult<()>;

    /// Newest first
    async fn list_recent(&self, limit: i64, offset: i64) -> StoreResult<Vec<Order>>;

    /// Highest order number starting with `prefix`. Longer numbers rank
    /// higher, so a zero-padded sequence that outgrows its width still sorts
    /// numerically.
    async fn latest_order_number(&self, prefix: &str) -> StoreResult<Option<String>>;
}

/// Source-address whitelist
#[async_trait]
pub trait WhitelistStore: Send + Sync {
    async fn find_active(&self, address: &str) -> StoreResult<Option<IpWhitelistEntry>>;

    async fn list(&self) -> StoreResult<Vec<IpWhitelistEntry>>;

    /// Fails with [`StoreError::Conflict`] when the address is already active
    async fn insert(&self, entry: &IpWhitelistEntry) -> StoreResult<()>;

    /// Returns `false` when no active entry had this id
    async fn deactivate(&self, id: i64) -> StoreResult<bool>;
}

/// Append-only external request log
#[async_trait]
pub trait ApiLogStore: Send + Sync {
    async fn append(&self, entry: &ApiRequestLog) -> StoreResult<()>;

    /// Newest first
    async fn list_recent(&self, limit: i64, offset: i64) -> StoreResult<Vec<ApiRequestLog>>;

    /// Delete rows older than `cutoff` (Unix millis)
    async fn purge_before(&self, cutoff: i64) -> StoreResult<u64>;
}

/// All stores, shared by every component
#[derive(Clone)]
pub struct Stores {
    pub catalog: Arc<dyn CatalogStore>,
    pub orders: Arc<dyn OrderStore>,
    pub whitelist: Arc<dyn WhitelistStore>,
    pub api_logs: Arc<dyn ApiLogStore>,
}

impl Stores {
    /// Every store backed by one PostgreSQL pool
    pub fn postgres(store: postgres::PgStore) -> Self {
        let store = Arc::new(store);
        Self {
            catalog: store.clone(),
            orders: store.clone(),
            whitelist: store.clone(),
            api_logs: store,
        }
    }

    /// Every store backed by one in-process store
    pub fn memory(store: Arc<memory::MemoryStore>) -> Self {
        Self {
            catalog: store.clone(),
            orders: store.clone(),
            whitelist: store.clone(),
            api_logs: store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn entry(device_id: i64, network: &str, storage: &str) -> PricingEntry {
        PricingEntry {
            id: 1,
            device_id,
            device_name: "Apple iPhone 16".into(),
            network: network.into(),
            storage: storage.into(),
            prices: GradePrices::new(Decimal::from(1), Decimal::from(1), Decimal::from(1)),
            updated_at: 0,
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = PricingFilter::default();
        assert!(filter.matches(&entry(1, "EE", "128GB")));
        assert!(filter.matches(&entry(2, "Unlocked", "256GB")));
    }

    #[test]
    fn test_filter_fields_are_conjunctive() {
        let filter = PricingFilter {
            device_id: Some(1),
            network: Some("EE".into()),
            storage: None,
        };
        assert!(filter.matches(&entry(1, "EE", "128GB")));
        assert!(!filter.matches(&entry(1, "O2", "128GB")));
        assert!(!filter.matches(&entry(2, "EE", "128GB")));
    }
}
