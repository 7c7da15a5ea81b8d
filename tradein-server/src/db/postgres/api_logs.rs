//! External request log queries

use async_trait::async_trait;
use shared::models::ApiRequestLog;

use super::PgStore;
use crate::db::{ApiLogStore, StoreResult};

#[derive(sqlx::FromRow)]
struct ApiLogRow {
    id: i64,
    timestamp: i64,
    source_ip: Option<String>,
    endpoint: String,
    method: String,
    status_code: i32,
    success: bool,
    order_number: Option<String>,
    request_payload: Option<String>,
    error_message: Option<String>,
    response_time_ms: i64,
}

impl From<ApiLogRow> for ApiRequestLog {
    fn from(row: ApiLogRow) -> Self {
        ApiRequestLog {
            id: row.id,
            timestamp: row.timestamp,
            source_ip: row.source_ip,
            endpoint: row.endpoint,
            method: row.method,
            status_code: u16::try_from(row.status_code).unwrap_or_default(),
            success: row.success,
            order_number: row.order_number,
            request_payload: row.request_payload,
            error_message: row.error_message,
            response_time_ms: row.response_time_ms,
        }
    }
}

#[async_trait]
impl ApiLogStore for PgStore {
    async fn append(&self, entry: &ApiRequestLog) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO api_request_logs (
                id, timestamp, source_ip, endpoint, method, status_code, success,
                order_number, request_payload, error_message, response_time_ms
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(entry.id)
        .bind(entry.timestamp)
        .bind(&entry.source_ip)
        .bind(&entry.endpoint)
        .bind(&entry.method)
        .bind(i32::from(entry.status_code))
        .bind(entry.success)
        .bind(&entry.order_number)
        .bind(&entry.request_payload)
        .bind(&entry.error_message)
        .bind(entry.response_time_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> StoreResult<Vec<ApiRequestLog>> {
        let rows: Vec<ApiLogRow> = sqlx::query_as(
            r#"
            SELECT id, timestamp, source_ip, endpoint, method, status_code, success,
                   order_number, request_payload, error_message, response_time_ms
            FROM api_request_logs ORDER BY timestamp DESC LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ApiRequestLog::from).collect())
    }

    async fn purge_before(&self, cutoff: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM api_request_logs WHERE timestamp < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
