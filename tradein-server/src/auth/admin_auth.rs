//! Bearer-token authentication for staff routes

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use shared::error::AppError;

use crate::state::AppState;

/// Compare without short-circuiting on the first differing byte
fn token_matches(presented: &str, expected: &str) -> bool {
    presented.len() == expected.len()
        && presented
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Middleware that checks `Authorization: Bearer <ADMIN_TOKEN>`
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::unauthorized()
                .with_detail("reason", "missing bearer token")
                .into_response()
        })?;

    if !token_matches(token.trim(), &state.config.admin_token) {
        tracing::debug!(path = %request.uri().path(), "Staff token rejected");
        return Err(AppError::unauthorized().into_response());
    }

    Ok(next.run(request).await)
}
