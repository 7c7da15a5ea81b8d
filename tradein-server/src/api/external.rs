//! Partner order submission

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::{Extension, Json};
use shared::error::AppError;

use crate::auth::ClientIp;
use crate::ingest::{ExternalOrderCreated, IngestRequest};
use crate::state::AppState;

/// POST /api/external/orders
///
/// Takes the raw body so that malformed JSON is audited like any other failure.
pub async fn create_order(
    State(state): State<AppState>,
    client_ip: Option<Extension<ClientIp>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Result<(StatusCode, Json<ExternalOrderCreated>), AppError> {
    let request = IngestRequest {
        source_ip: client_ip.map(|Extension(ClientIp(ip))| ip.to_string()),
        endpoint: uri.path().to_string(),
        method: method.to_string(),
        body: body.to_vec(),
    };

    let created = state.ingestion.handle(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
