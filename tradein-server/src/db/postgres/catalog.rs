//! Device and pricing queries

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{Device, GradePrices, PricingEntry};

use super::{PgStore, map_unique};
use crate::db::{CatalogStore, PricingFilter, StoreResult};

#[derive(sqlx::FromRow)]
struct DeviceRow {
    id: i64,
    brand: String,
    model: String,
    full_name: String,
    category: String,
    is_active: bool,
}

impl From<DeviceRow> for Device {
    fn from(row: DeviceRow) -> Self {
        Device {
            id: row.id,
            brand: row.brand,
            model: row.model,
            full_name: row.full_name,
            category: row.category,
            is_active: row.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PricingRow {
    id: i64,
    device_id: i64,
    device_name: String,
    network: String,
    storage: String,
    price_new: Decimal,
    price_good: Decimal,
    price_broken: Decimal,
    updated_at: i64,
}

impl From<PricingRow> for PricingEntry {
    fn from(row: PricingRow) -> Self {
        PricingEntry {
            id: row.id,
            device_id: row.device_id,
            device_name: row.device_name,
            network: row.network,
            storage: row.storage,
            prices: GradePrices::new(row.price_new, row.price_good, row.price_broken),
            updated_at: row.updated_at,
        }
    }
}

const PRICING_COLUMNS: &str = "id, device_id, device_name, network, storage, price_new, price_good, price_broken, updated_at";

#[async_trait]
impl CatalogStore for PgStore {
    async fn find_active_device_by_name(&self, name: &str) -> StoreResult<Option<Device>> {
        let row: Option<DeviceRow> = sqlx::query_as(
            "SELECT id, brand, model, full_name, category, is_active FROM devices WHERE full_name = $1 AND is_active LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Device::from))
    }

    async fn find_device(&self, id: i64) -> StoreResult<Option<Device>> {
        let row: Option<DeviceRow> = sqlx::query_as(
            "SELECT id, brand, model, full_name, category, is_active FROM devices WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Device::from))
    }

    async fn find_pricing(
        &self,
        device_id: i64,
        network: &str,
        storage: &str,
    ) -> StoreResult<Option<PricingEntry>> {
        let row: Option<PricingRow> = sqlx::query_as(&format!(
            "SELECT {PRICING_COLUMNS} FROM pricing WHERE device_id = $1 AND network = $2 AND storage = $3"
        ))
        .bind(device_id)
        .bind(network)
        .bind(storage)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(PricingEntry::from))
    }

    async fn list_pricing(&self, filter: &PricingFilter) -> StoreResult<Vec<PricingEntry>> {
        let rows: Vec<PricingRow> = sqlx::query_as(&format!(
            r#"
            SELECT {PRICING_COLUMNS} FROM pricing
            WHERE ($1::BIGINT IS NULL OR device_id = $1)
              AND ($2::TEXT IS NULL OR network = $2)
              AND ($3::TEXT IS NULL OR storage = $3)
            ORDER BY device_name, network, storage
            "#
        ))
        .bind(filter.device_id)
        .bind(filter.network.as_deref())
        .bind(filter.storage.as_deref())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PricingEntry::from).collect())
    }

    async fn update_prices(&self, updates: &[(i64, GradePrices)], now: i64) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for (id, prices) in updates {
            written += sqlx::query(
                "UPDATE pricing SET price_new = $1, price_good = $2, price_broken = $3, updated_at = $4 WHERE id = $5",
            )
            .bind(prices.price_new)
            .bind(prices.price_good)
            .bind(prices.price_broken)
            .bind(now)
            .bind(*id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }
        tx.commit().await?;
        Ok(written)
    }

    async fn replace_device_pricing(
        &self,
        device_id: i64,
        entries: &[PricingEntry],
    ) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM pricing WHERE device_id = $1")
            .bind(device_id)
            .execute(&mut *tx)
            .await?;

        for entry in entries {
            sqlx::query(&format!(
                "INSERT INTO pricing ({PRICING_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
            ))
            .bind(entry.id)
            .bind(entry.device_id)
            .bind(&entry.device_name)
            .bind(&entry.network)
            .bind(&entry.storage)
            .bind(entry.prices.price_new)
            .bind(entry.prices.price_good)
            .bind(entry.prices.price_broken)
            .bind(entry.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                map_unique(e, || {
                    format!(
                        "pricing for device {} ({} / {}) already exists",
                        entry.device_id, entry.network, entry.storage
                    )
                })
            })?;
        }
        tx.commit().await?;
        Ok(entries.len() as u64)
    }
}
