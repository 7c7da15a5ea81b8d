//! External request log endpoints

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::ApiRequestLog;
use shared::util::now_millis;

use super::{ApiResult, bad_query, page_window};
use crate::error::ServiceError;
use crate::state::AppState;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Deserialize)]
pub struct LogsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Deserialize)]
pub struct PurgeQuery {
    pub older_than_days: i64,
}

/// GET /api/api-logs
pub async fn list_logs(
    State(state): State<AppState>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> ApiResult<Vec<ApiRequestLog>> {
    let Query(q) = query.map_err(bad_query)?;
    let (limit, offset) = page_window(q.page, q.per_page);
    let logs = state
        .stores
        .api_logs
        .list_recent(limit, offset)
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(logs))
}

/// DELETE /api/api-logs?older_than_days=N
pub async fn purge_logs(
    State(state): State<AppState>,
    query: Result<Query<PurgeQuery>, QueryRejection>,
) -> ApiResult<serde_json::Value> {
    let Query(q) = query.map_err(bad_query)?;
    if q.older_than_days < 1 {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "older_than_days must be at least 1",
        ));
    }

    let cutoff = now_millis() - q.older_than_days.saturating_mul(MILLIS_PER_DAY);
    let deleted = state
        .stores
        .api_logs
        .purge_before(cutoff)
        .await
        .map_err(ServiceError::from)?;

    tracing::info!(older_than_days = q.older_than_days, deleted, "Request logs purged");
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}
