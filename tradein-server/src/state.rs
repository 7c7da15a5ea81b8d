//! Application state

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::audit::AuditLogger;
use crate::auth::AccessGate;
use crate::config::Config;
use crate::db::Stores;
use crate::ingest::{IngestionService, build_generator};
use crate::notify::{NotificationDispatcher, Notifier};
use crate::orders::OrderService;
use crate::pricing::PricingEngine;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub stores: Stores,
    pub gate: AccessGate,
    pub ingestion: Arc<IngestionService>,
    pub orders: Arc<OrderService>,
    pub pricing: PricingEngine,
}

/// Audit and notification workers
///
/// Each worker exits once every [`AppState`] clone holding its sender is
/// dropped, after draining what was already queued.
pub struct BackgroundTasks {
    audit: JoinHandle<()>,
    notify: JoinHandle<()>,
}

impl BackgroundTasks {
    /// Wait for both workers to drain and stop
    pub async fn join(self) {
        if let Err(e) = self.audit.await {
            tracing::error!("Audit worker panicked: {e}");
        }
        if let Err(e) = self.notify.await {
            tracing::error!("Notification worker panicked: {e}");
        }
    }
}

impl AppState {
    /// Wire every component onto `stores` and start the background workers
    pub fn new(config: Config, stores: Stores, notifier: Arc<dyn Notifier>) -> (Self, BackgroundTasks) {
        let (audit, audit_task) = AuditLogger::spawn(
            stores.api_logs.clone(),
            config.audit_buffer_size,
            config.redact_payout_details,
        );
        let (dispatcher, notify_task) =
            NotificationDispatcher::spawn(notifier, config.notify_buffer_size);

        let numbers = build_generator(
            config.order_number_strategy,
            &config.order_number_prefix,
            stores.orders.clone(),
        );

        let state = Self {
            gate: AccessGate::new(stores.whitelist.clone(), config.allow_loopback),
            ingestion: Arc::new(IngestionService::new(
                stores.catalog.clone(),
                stores.orders.clone(),
                numbers,
                dispatcher.clone(),
                audit,
            )),
            orders: Arc::new(OrderService::new(stores.orders.clone(), dispatcher)),
            pricing: PricingEngine::new(stores.catalog.clone()),
            config: Arc::new(config),
            stores,
        };

        (
            state,
            BackgroundTasks {
                audit: audit_task,
                notify: notify_task,
            },
        )
    }
}
