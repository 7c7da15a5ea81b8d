//! External request audit trail
//!
//! Every ingestion attempt past the access gate produces exactly one
//! [`ApiRequestLog`] row. Handlers call [`AuditLogger::record`], which never
//! fails and waits for channel capacity when the worker falls behind; a
//! background [`AuditWorker`] drains the channel into the [`ApiLogStore`].

mod redact;
mod worker;

pub use redact::{REDACTED, redact_payload};
pub use worker::AuditWorker;

use std::sync::Arc;

use shared::models::ApiRequestLog;
use shared::util::{now_millis, snowflake_id};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendError;
use tokio::task::JoinHandle;

use crate::db::ApiLogStore;

/// One ingestion outcome, before id and timestamp are assigned
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub source_ip: Option<String>,
    pub endpoint: String,
    pub method: String,
    pub status_code: u16,
    pub success: bool,
    pub order_number: Option<String>,
    /// Raw request body as received
    pub request_payload: Option<String>,
    pub error_message: Option<String>,
    pub response_time_ms: i64,
}

/// Queued audit writer
#[derive(Clone)]
pub struct AuditLogger {
    tx: mpsc::Sender<ApiRequestLog>,
    redact_payout: bool,
}

impl AuditLogger {
    /// Start the background worker; it stops once every logger clone is dropped
    pub fn spawn(
        store: Arc<dyn ApiLogStore>,
        buffer_size: usize,
        redact_payout: bool,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        let handle = tokio::spawn(AuditWorker::new(store).run(rx));
        (Self { tx, redact_payout }, handle)
    }

    /// Queue one row, applying backpressure when the channel is full.
    /// Failures are logged, never returned.
    pub async fn record(&self, entry: AuditEntry) {
        let request_payload = match entry.request_payload {
            Some(raw) if self.redact_payout => Some(redact_payload(&raw)),
            other => other,
        };

        let row = ApiRequestLog {
            id: snowflake_id(),
            timestamp: now_millis(),
            source_ip: entry.source_ip,
            endpoint: entry.endpoint,
            method: entry.method,
            status_code: entry.status_code,
            success: entry.success,
            order_number: entry.order_number,
            request_payload,
            error_message: entry.error_message,
            response_time_ms: entry.response_time_ms,
        };

        if let Err(SendError(row)) = self.tx.send(row).await {
            tracing::error!(
                endpoint = %row.endpoint,
                status = row.status_code,
                "Audit worker stopped, dropping request log"
            );
        }
    }
}
