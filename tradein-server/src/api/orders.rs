//! Staff order endpoints

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use shared::models::OrderView;
use shared::order::OrderStatus;

use super::{ApiResult, bad_body, bad_query, page_window};
use crate::orders::OrderUpdate;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct OrdersQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// GET /api/orders
pub async fn list_orders(
    State(state): State<AppState>,
    query: Result<Query<OrdersQuery>, QueryRejection>,
) -> ApiResult<Vec<OrderView>> {
    let Query(query) = query.map_err(bad_query)?;
    let (limit, offset) = page_window(query.page, query.per_page);
    let orders = state.orders.list(limit, offset).await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

/// GET /api/orders/{order_number}
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> ApiResult<OrderView> {
    let order = state.orders.get(&order_number).await?;
    Ok(Json(order.into()))
}

/// PATCH /api/orders/{order_number}/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<OrderView> {
    let Json(body) = body.map_err(bad_body)?;
    let order = state.orders.update_status(&order_number, body.status).await?;
    Ok(Json(order.into()))
}

/// PUT /api/orders/{order_number}
pub async fn update_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    body: Result<Json<OrderUpdate>, JsonRejection>,
) -> ApiResult<OrderView> {
    let Json(update) = body.map_err(bad_body)?;
    let order = state.orders.update_order(&order_number, update).await?;
    Ok(Json(order.into()))
}
