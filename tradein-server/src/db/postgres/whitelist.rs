//! IP whitelist queries

use async_trait::async_trait;
use shared::models::IpWhitelistEntry;

use super::{PgStore, map_unique};
use crate::db::{StoreResult, WhitelistStore};

#[derive(sqlx::FromRow)]
struct WhitelistRow {
    id: i64,
    address: String,
    label: String,
    is_active: bool,
    created_at: i64,
}

impl From<WhitelistRow> for IpWhitelistEntry {
    fn from(row: WhitelistRow) -> Self {
        IpWhitelistEntry {
            id: row.id,
            address: row.address,
            label: row.label,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl WhitelistStore for PgStore {
    async fn find_active(&self, address: &str) -> StoreResult<Option<IpWhitelistEntry>> {
        let row: Option<WhitelistRow> = sqlx::query_as(
            "SELECT id, address, label, is_active, created_at FROM ip_whitelist WHERE address = $1 AND is_active",
        )
        .bind(address)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(IpWhitelistEntry::from))
    }

    async fn list(&self) -> StoreResult<Vec<IpWhitelistEntry>> {
        let rows: Vec<WhitelistRow> = sqlx::query_as(
            "SELECT id, address, label, is_active, created_at FROM ip_whitelist ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(IpWhitelistEntry::from).collect())
    }

    async fn insert(&self, entry: &IpWhitelistEntry) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO ip_whitelist (id, address, label, is_active, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.id)
        .bind(&entry.address)
        .bind(&entry.label)
        .bind(entry.is_active)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, || format!("address {} is already whitelisted", entry.address)))?;
        Ok(())
    }

    async fn deactivate(&self, id: i64) -> StoreResult<bool> {
        let result =
            sqlx::query("UPDATE ip_whitelist SET is_active = FALSE WHERE id = $1 AND is_active")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
