//! HTTP routes
//!
//! - `/health`: public
//! - `/api/external/*`: partner gateway, source-address whitelist
//! - everything else under `/api`: staff, bearer admin token

pub mod api_logs;
pub mod external;
pub mod health;
pub mod orders;
pub mod pricing;
pub mod whitelist;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router, middleware};
use shared::error::{AppError, ErrorCode};
use tower_http::trace::TraceLayer;

use crate::auth::{access_gate_middleware, admin_auth_middleware};
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<T>, AppError>;

/// Map a body rejection onto the platform error envelope
pub(crate) fn bad_body(rejection: JsonRejection) -> AppError {
    AppError::with_message(ErrorCode::InvalidFormat, "Malformed request body")
        .with_detail("reason", rejection.body_text())
}

pub(crate) fn bad_query(rejection: QueryRejection) -> AppError {
    AppError::with_message(ErrorCode::InvalidRequest, "Malformed query string")
        .with_detail("reason", rejection.body_text())
}

/// Page/per-page to limit/offset, 20 per page by default, at most 100
pub(crate) fn page_window(page: Option<i64>, per_page: Option<i64>) -> (i64, i64) {
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    let page = page.unwrap_or(1).max(1);
    (per_page, (page - 1).saturating_mul(per_page))
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Partner gateway (whitelist gated)
    let external = Router::new()
        .route("/api/external/orders", post(external::create_order))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            access_gate_middleware,
        ));

    // Staff API (admin token)
    let staff = Router::new()
        .route("/api/orders", get(orders::list_orders))
        .route(
            "/api/orders/{order_number}",
            get(orders::get_order).put(orders::update_order),
        )
        .route(
            "/api/orders/{order_number}/status",
            patch(orders::update_status),
        )
        .route("/api/pricing/quote", get(pricing::quote))
        .route("/api/pricing/bulk-adjust", post(pricing::bulk_adjust))
        .route("/api/pricing/gaps", post(pricing::find_gaps))
        .route("/api/pricing/clone", post(pricing::clone_pricing))
        .route("/api/pricing/top-payers", get(pricing::top_payers))
        .route("/api/pricing/stats", get(pricing::statistics))
        .route(
            "/api/whitelist",
            get(whitelist::list_entries).post(whitelist::add_entry),
        )
        .route("/api/whitelist/{id}", delete(whitelist::deactivate_entry))
        .route(
            "/api/api-logs",
            get(api_logs::list_logs).delete(api_logs::purge_logs),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(external)
        .merge(staff)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
