//! In-process store
//!
//! Used for local development without PostgreSQL and by the test suite.
//! Enforces the same uniqueness rules as the SQL schema.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::models::{
    ApiRequestLog, Device, GradePrices, IpWhitelistEntry, Order, PricingEntry,
};

use super::{
    ApiLogStore, CatalogStore, OrderStore, PricingFilter, StoreError, StoreResult, WhitelistStore,
};

#[derive(Default)]
pub struct MemoryStore {
    devices: RwLock<Vec<Device>>,
    pricing: RwLock<Vec<PricingEntry>>,
    orders: RwLock<Vec<Order>>,
    whitelist: RwLock<Vec<IpWhitelistEntry>>,
    api_logs: RwLock<Vec<ApiRequestLog>>,
    pricing_lookups: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a device by id
    pub fn put_device(&self, device: Device) {
        let mut devices = self.devices.write();
        devices.retain(|d| d.id != device.id);
        devices.push(device);
    }

    /// Insert or replace a pricing entry by its (device, network, storage) triple
    pub fn put_pricing(&self, entry: PricingEntry) {
        let mut pricing = self.pricing.write();
        pricing.retain(|p| {
            !(p.device_id == entry.device_id
                && p.network == entry.network
                && p.storage == entry.storage)
        });
        pricing.push(entry);
    }

    /// Number of `find_pricing` calls served so far
    pub fn pricing_lookup_count(&self) -> usize {
        self.pricing_lookups.load(Ordering::Relaxed)
    }

    pub fn order_count(&self) -> usize {
        self.orders.read().len()
    }

    pub fn api_log_snapshot(&self) -> Vec<ApiRequestLog> {
        self.api_logs.read().clone()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find_active_device_by_name(&self, name: &str) -> StoreResult<Option<Device>> {
        Ok(self
            .devices
            .read()
            .iter()
            .find(|d| d.is_active && d.full_name == name)
            .cloned())
    }

    async fn find_device(&self, id: i64) -> StoreResult<Option<Device>> {
        Ok(self.devices.read().iter().find(|d| d.id == id).cloned())
    }

    async fn find_pricing(
        &self,
        device_id: i64,
        network: &str,
        storage: &str,
    ) -> StoreResult<Option<PricingEntry>> {
        self.pricing_lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .pricing
            .read()
            .iter()
            .find(|p| p.device_id == device_id && p.network == network && p.storage == storage)
            .cloned())
    }

    async fn list_pricing(&self, filter: &PricingFilter) -> StoreResult<Vec<PricingEntry>> {
        Ok(self
            .pricing
            .read()
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn update_prices(&self, updates: &[(i64, GradePrices)], now: i64) -> StoreResult<u64> {
        let mut pricing = self.pricing.write();
        let mut written = 0;
        for (id, prices) in updates {
            if let Some(entry) = pricing.iter_mut().find(|p| p.id == *id) {
                entry.prices = *prices;
                entry.updated_at = now;
                written += 1;
            }
        }
        Ok(written)
    }

    async fn replace_device_pricing(
        &self,
        device_id: i64,
        entries: &[PricingEntry],
    ) -> StoreResult<u64> {
        let mut pricing = self.pricing.write();
        pricing.retain(|p| p.device_id != device_id);
        pricing.extend(entries.iter().cloned());
        Ok(entries.len() as u64)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert(&self, order: &Order) -> StoreResult<()> {
        let mut orders = self.orders.write();
        if orders.iter().any(|o| o.order_number == order.order_number) {
            return Err(StoreError::Conflict(format!(
                "order number {} already exists",
                order.order_number
            )));
        }
        orders.push(order.clone());
        Ok(())
    }

    async fn find_by_number(&self, order_number: &str) -> StoreResult<Option<Order>> {
        Ok(self
            .orders
            .read()
            .iter()
            .find(|o| o.order_number == order_number)
            .cloned())
    }

    async fn update(&self, order: &Order) -> StoreResult<()> {
        let mut orders = self.orders.write();
        let slot = orders
            .iter_mut()
            .find(|o| o.order_number == order.order_number)
            .ok_or_else(|| StoreError::NotFound(order.order_number.clone()))?;
        *slot = order.clone();
        Ok(())
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> StoreResult<Vec<Order>> {
        let mut orders = self.orders.read().clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn latest_order_number(&self, prefix: &str) -> StoreResult<Option<String>> {
        Ok(self
            .orders
            .read()
            .iter()
            .map(|o| &o.order_number)
            .filter(|n| n.starts_with(prefix))
            .max_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
            .cloned())
    }
}

#[async_trait]
impl WhitelistStore for MemoryStore {
    async fn find_active(&self, address: &str) -> StoreResult<Option<IpWhitelistEntry>> {
        Ok(self
            .whitelist
            .read()
            .iter()
            .find(|e| e.is_active && e.address == address)
            .cloned())
    }

    async fn list(&self) -> StoreResult<Vec<IpWhitelistEntry>> {
        Ok(self.whitelist.read().clone())
    }

    async fn insert(&self, entry: &IpWhitelistEntry) -> StoreResult<()> {
        let mut whitelist = self.whitelist.write();
        if entry.is_active
            && whitelist
                .iter()
                .any(|e| e.is_active && e.address == entry.address)
        {
            return Err(StoreError::Conflict(format!(
                "address {} is already whitelisted",
                entry.address
            )));
        }
        whitelist.push(entry.clone());
        Ok(())
    }

    async fn deactivate(&self, id: i64) -> StoreResult<bool> {
        let mut whitelist = self.whitelist.write();
        match whitelist.iter_mut().find(|e| e.id == id && e.is_active) {
            Some(entry) => {
                entry.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ApiLogStore for MemoryStore {
    async fn append(&self, entry: &ApiRequestLog) -> StoreResult<()> {
        self.api_logs.write().push(entry.clone());
        Ok(())
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> StoreResult<Vec<ApiRequestLog>> {
        let mut logs = self.api_logs.read().clone();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(logs
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn purge_before(&self, cutoff: i64) -> StoreResult<u64> {
        let mut logs = self.api_logs.write();
        let before = logs.len();
        logs.retain(|l| l.timestamp >= cutoff);
        Ok((before - logs.len()) as u64)
    }
}
