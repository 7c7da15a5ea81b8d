//! Audit log background worker
//!
//! Consumes rows from the mpsc channel and appends them to the store.
//! Exits when the channel closes.

use std::sync::Arc;

use shared::models::ApiRequestLog;
use tokio::sync::mpsc;

use crate::db::ApiLogStore;

pub struct AuditWorker {
    store: Arc<dyn ApiLogStore>,
}

impl AuditWorker {
    pub fn new(store: Arc<dyn ApiLogStore>) -> Self {
        Self { store }
    }

    /// Run until the channel closes
    pub async fn run(self, mut rx: mpsc::Receiver<ApiRequestLog>) {
        tracing::info!("Audit log worker started");

        while let Some(row) = rx.recv().await {
            match self.store.append(&row).await {
                Ok(()) => {
                    tracing::debug!(
                        audit_id = row.id,
                        status = row.status_code,
                        success = row.success,
                        "Request log recorded"
                    );
                }
                Err(e) => {
                    tracing::error!(audit_id = row.id, error = %e, "Failed to write request log");
                }
            }
        }

        tracing::info!("Audit log channel closed, worker stopping");
    }
}
