//! Staff pricing endpoints

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::Grade;

use super::{ApiResult, bad_body, bad_query};
use crate::db::PricingFilter;
use crate::pricing::{
    BulkAdjustResult, CloneResult, PricingGap, PricingStatistics, Quote, TopPayer,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct QuoteQuery {
    pub device_id: i64,
    pub network: String,
    pub storage: String,
    pub grade: String,
}

#[derive(Deserialize)]
pub struct BulkAdjustRequest {
    #[serde(default)]
    pub filter: PricingFilter,
    pub percent: Decimal,
}

#[derive(Deserialize)]
pub struct GapsRequest {
    pub device_id: i64,
    pub networks: Vec<String>,
    pub storages: Vec<String>,
}

#[derive(Deserialize)]
pub struct CloneRequest {
    pub source_device_id: i64,
    pub target_device_id: i64,
    #[serde(default = "default_multiplier")]
    pub multiplier: Decimal,
}

fn default_multiplier() -> Decimal {
    Decimal::ONE
}

#[derive(Deserialize)]
pub struct TopPayersQuery {
    pub limit: Option<usize>,
    pub grade: Option<String>,
}

/// GET /api/pricing/quote
pub async fn quote(
    State(state): State<AppState>,
    query: Result<Query<QuoteQuery>, QueryRejection>,
) -> ApiResult<Quote> {
    let Query(q) = query.map_err(bad_query)?;
    let quote = state
        .pricing
        .quote(q.device_id, &q.network, &q.storage, &q.grade)
        .await?;
    Ok(Json(quote))
}

/// POST /api/pricing/bulk-adjust
pub async fn bulk_adjust(
    State(state): State<AppState>,
    body: Result<Json<BulkAdjustRequest>, JsonRejection>,
) -> ApiResult<BulkAdjustResult> {
    let Json(req) = body.map_err(bad_body)?;
    Ok(Json(state.pricing.bulk_adjust(&req.filter, req.percent).await?))
}

/// POST /api/pricing/gaps
pub async fn find_gaps(
    State(state): State<AppState>,
    body: Result<Json<GapsRequest>, JsonRejection>,
) -> ApiResult<Vec<PricingGap>> {
    let Json(req) = body.map_err(bad_body)?;
    let gaps = state
        .pricing
        .find_gaps(req.device_id, &req.networks, &req.storages)
        .await?;
    Ok(Json(gaps))
}

/// POST /api/pricing/clone
pub async fn clone_pricing(
    State(state): State<AppState>,
    body: Result<Json<CloneRequest>, JsonRejection>,
) -> ApiResult<CloneResult> {
    let Json(req) = body.map_err(bad_body)?;
    let result = state
        .pricing
        .clone_pricing(req.source_device_id, req.target_device_id, req.multiplier)
        .await?;
    Ok(Json(result))
}

/// GET /api/pricing/top-payers?limit=10&grade=GOOD
pub async fn top_payers(
    State(state): State<AppState>,
    query: Result<Query<TopPayersQuery>, QueryRejection>,
) -> ApiResult<Vec<TopPayer>> {
    let Query(q) = query.map_err(bad_query)?;
    let grade = match q.grade.as_deref() {
        Some(raw) => raw.parse::<Grade>().map_err(|e| {
            AppError::with_message(ErrorCode::InvalidGrade, e.to_string())
        })?,
        None => Grade::Good,
    };
    let limit = q.limit.unwrap_or(10).clamp(1, 100);
    Ok(Json(state.pricing.top_paying_devices(limit, grade).await?))
}

/// GET /api/pricing/stats
pub async fn statistics(State(state): State<AppState>) -> ApiResult<PricingStatistics> {
    Ok(Json(state.pricing.statistics().await?))
}
