//! Unified service-layer error type
//!
//! `ServiceError` bridges storage errors ([`StoreError`]) and the API-layer
//! error ([`AppError`]) so handlers and services can use `?` throughout.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::db::StoreError;

/// Service-layer error
///
/// - `Store`: storage failure (logged, mapped to InternalError unless it is a conflict)
/// - `App`: business-rule error, passed through to the client unchanged
#[derive(Debug)]
pub enum ServiceError {
    Store(StoreError),
    App(AppError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        ServiceError::Store(e)
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Store(e.into())
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Store(StoreError::Conflict(what)) => {
                AppError::with_message(ErrorCode::AlreadyExists, what)
            }
            ServiceError::Store(StoreError::NotFound(what)) => AppError::not_found(what),
            ServiceError::Store(store_err) => {
                tracing::error!(error = %store_err, "Service storage error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;
