//! Whitelist management endpoints

use std::net::IpAddr;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use shared::error::{AppError, ErrorCode};
use shared::models::{IpWhitelistCreate, IpWhitelistEntry};
use shared::util::{now_millis, snowflake_id};

use super::{ApiResult, bad_body};
use crate::state::AppState;

/// GET /api/whitelist
pub async fn list_entries(State(state): State<AppState>) -> ApiResult<Vec<IpWhitelistEntry>> {
    let entries = state.stores.whitelist.list().await.map_err(crate::error::ServiceError::from)?;
    Ok(Json(entries))
}

/// POST /api/whitelist
///
/// Addresses are stored in canonical form so that IPv4-mapped IPv6 input
/// matches the gate's normalized lookup.
pub async fn add_entry(
    State(state): State<AppState>,
    body: Result<Json<IpWhitelistCreate>, JsonRejection>,
) -> ApiResult<IpWhitelistEntry> {
    let Json(req) = body.map_err(bad_body)?;
    let address = req
        .address
        .trim()
        .parse::<IpAddr>()
        .map_err(|_| {
            AppError::with_message(ErrorCode::InvalidFormat, "address must be an IPv4 or IPv6 literal")
                .with_detail("address", req.address.clone())
        })?
        .to_canonical();

    let entry = IpWhitelistEntry {
        id: snowflake_id(),
        address: address.to_string(),
        label: req.label.trim().to_string(),
        is_active: true,
        created_at: now_millis(),
    };
    state
        .stores
        .whitelist
        .insert(&entry)
        .await
        .map_err(crate::error::ServiceError::from)?;

    tracing::info!(address = %entry.address, label = %entry.label, "Whitelist entry added");
    Ok(Json(entry))
}

/// DELETE /api/whitelist/{id}
pub async fn deactivate_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    let deactivated = state
        .stores
        .whitelist
        .deactivate(id)
        .await
        .map_err(crate::error::ServiceError::from)?;
    if !deactivated {
        return Err(AppError::not_found(format!("Whitelist entry {id}")));
    }

    tracing::info!(id, "Whitelist entry deactivated");
    Ok(Json(serde_json::json!({ "id": id, "is_active": false })))
}
