//! External order creation
//!
//! [`IngestionService::handle`] is the single entry point for partner
//! submissions. It never returns without queuing exactly one audit row.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{CustomerContact, DeviceSnapshot, Order};
use shared::order::{OrderOrigin, OrderStatus, PaymentStatus};
use shared::util::{now_millis, snowflake_id};

use super::order_number::OrderNumberGenerator;
use super::payload::{ExternalOrderPayload, ValidatedPayload};
use crate::audit::{AuditEntry, AuditLogger};
use crate::db::{CatalogStore, OrderStore, StoreError};
use crate::error::{ServiceError, ServiceResult};
use crate::notify::{NotificationDispatcher, NotificationEvent};

/// Attempts at generate-then-insert before a number conflict is surfaced
pub const MAX_ORDER_NUMBER_ATTEMPTS: u32 = 3;

/// Raw inbound request as seen past the access gate
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub source_ip: Option<String>,
    pub endpoint: String,
    pub method: String,
    pub body: Vec<u8>,
}

/// Success body of the external endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ExternalOrderCreated {
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: i64,
}

pub struct IngestionService {
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
    numbers: Arc<dyn OrderNumberGenerator>,
    notifier: NotificationDispatcher,
    audit: AuditLogger,
}

impl IngestionService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        orders: Arc<dyn OrderStore>,
        numbers: Arc<dyn OrderNumberGenerator>,
        notifier: NotificationDispatcher,
        audit: AuditLogger,
    ) -> Self {
        Self {
            catalog,
            orders,
            numbers,
            notifier,
            audit,
        }
    }

    /// Parse, validate and create, then record the outcome
    pub async fn handle(&self, request: IngestRequest) -> Result<ExternalOrderCreated, AppError> {
        let started = Instant::now();
        let raw = String::from_utf8_lossy(&request.body).into_owned();

        let result = match parse_body(&request.body) {
            Ok(payload) => self
                .create_external_order(payload)
                .await
                .map_err(AppError::from),
            Err(e) => Err(e),
        };

        let (status_code, order_number, error_message) = match &result {
            Ok(created) => (201, Some(created.order_number.clone()), None),
            Err(e) => (e.http_status().as_u16(), None, Some(e.message.clone())),
        };

        match &result {
            Ok(created) => tracing::info!(
                order_number = %created.order_number,
                source_ip = request.source_ip.as_deref().unwrap_or("unknown"),
                "External order created"
            ),
            Err(e) => tracing::warn!(
                code = %e.code,
                status = status_code,
                source_ip = request.source_ip.as_deref().unwrap_or("unknown"),
                error = %e.message,
                "External order rejected"
            ),
        }

        self.audit
            .record(AuditEntry {
                source_ip: request.source_ip,
                endpoint: request.endpoint,
                method: request.method,
                status_code,
                success: result.is_ok(),
                order_number,
                request_payload: (!raw.is_empty()).then_some(raw),
                error_message,
                response_time_ms: started.elapsed().as_millis() as i64,
            })
            .await;

        result
    }

    /// Validate against the catalog and persist a new `API` order
    pub async fn create_external_order(
        &self,
        payload: ExternalOrderPayload,
    ) -> ServiceResult<ExternalOrderCreated> {
        let valid = payload.validate()?;

        let device = self
            .catalog
            .find_active_device_by_name(&valid.device_name)
            .await?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::DeviceNotFound,
                    format!("Device '{}' not found", valid.device_name),
                )
                .with_detail("device_name", valid.device_name.clone())
            })?;

        if let Some(storage) = &valid.storage
            && self
                .catalog
                .find_pricing(device.id, &valid.network, storage)
                .await?
                .is_none()
        {
            return Err(AppError::with_message(
                ErrorCode::PricingCombinationInvalid,
                format!(
                    "Invalid network/storage combination for {}: {} / {}",
                    device.full_name, valid.network, storage
                ),
            )
            .with_detail("network", valid.network.clone())
            .with_detail("storage", storage.clone())
            .into());
        }

        let order = self.insert_with_fresh_number(&valid).await?;

        if order.customer.email.is_some() {
            self.notifier
                .dispatch(NotificationEvent::OrderConfirmation(order.clone()));
        }

        Ok(ExternalOrderCreated {
            payment_status: order.payment_status(),
            order_number: order.order_number,
            status: order.status,
            created_at: order.created_at,
        })
    }

    async fn insert_with_fresh_number(&self, valid: &ValidatedPayload) -> ServiceResult<Order> {
        let mut attempt = 1;
        loop {
            let order = build_order(valid, self.numbers.next().await?);
            match self.orders.insert(&order).await {
                Ok(()) => return Ok(order),
                Err(StoreError::Conflict(_)) if attempt < MAX_ORDER_NUMBER_ATTEMPTS => {
                    tracing::warn!(
                        order_number = %order.order_number,
                        attempt,
                        "Order number collision, regenerating"
                    );
                    attempt += 1;
                }
                Err(StoreError::Conflict(_)) => {
                    return Err(ServiceError::App(AppError::new(
                        ErrorCode::OrderNumberConflict,
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn parse_body(body: &[u8]) -> Result<ExternalOrderPayload, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        AppError::with_message(ErrorCode::InvalidFormat, "Request body must be a JSON object")
            .with_detail("reason", e.to_string())
    })
}

fn build_order(valid: &ValidatedPayload, order_number: String) -> Order {
    let now = now_millis();
    Order {
        id: snowflake_id(),
        order_number,
        origin: OrderOrigin::Api,
        status: OrderStatus::INITIAL,
        customer: CustomerContact {
            name: valid.customer_name.clone(),
            phone: valid.customer_phone.clone(),
            email: valid.customer_email.clone(),
            address: valid.customer_address.clone(),
        },
        device: DeviceSnapshot {
            name: valid.device_name.clone(),
            network: valid.network.clone(),
            grade: valid.grade,
            storage: valid.storage_label().to_string(),
        },
        offered_price: valid.offered_price,
        final_price: None,
        postage_method: valid.postage_method,
        payout: valid.payout.clone(),
        transaction_id: valid.transaction_id.clone(),
        price_revision_reason: None,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::{ApiLogStore, StoreResult};
    use crate::ingest::order_number::RandomSuffix;
    use crate::notify::tests::RecordingNotifier;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use serde_json::json;
    use shared::models::{Device, GradePrices, PricingEntry};

    struct Harness {
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
        service: IngestionService,
        workers: Vec<tokio::task::JoinHandle<()>>,
    }

    impl Harness {
        fn new(numbers: Arc<dyn OrderNumberGenerator>) -> Self {
            let store = Arc::new(MemoryStore::new());
            store.put_device(Device {
                id: 16,
                brand: "Apple".into(),
                model: "iPhone 16".into(),
                full_name: "Apple iPhone 16".into(),
                category: "phone".into(),
                is_active: true,
            });
            store.put_pricing(PricingEntry {
                id: 1,
                device_id: 16,
                device_name: "Apple iPhone 16".into(),
                network: "Unlocked".into(),
                storage: "128GB".into(),
                prices: GradePrices::new(
                    Decimal::from(520),
                    Decimal::from(400),
                    Decimal::from(90),
                ),
                updated_at: 0,
            });

            let notifier = Arc::new(RecordingNotifier::new());
            let (dispatcher, notify_worker) = NotificationDispatcher::spawn(notifier.clone(), 16);
            let (audit, audit_worker) = AuditLogger::spawn(store.clone(), 16, true);
            let service =
                IngestionService::new(store.clone(), store.clone(), numbers, dispatcher, audit);
            Self {
                store,
                notifier,
                service,
                workers: vec![notify_worker, audit_worker],
            }
        }

        /// Drop the service and wait for queued audit rows and notifications
        async fn finish(self) -> (Arc<MemoryStore>, Arc<RecordingNotifier>) {
            drop(self.service);
            for worker in self.workers {
                worker.await.unwrap();
            }
            (self.store, self.notifier)
        }
    }

    fn request(body: serde_json::Value) -> IngestRequest {
        IngestRequest {
            source_ip: Some("203.0.113.7".into()),
            endpoint: "/api/external/orders".into(),
            method: "POST".into(),
            body: body.to_string().into_bytes(),
        }
    }

    fn smith() -> serde_json::Value {
        json!({
            "customer_name": "J Smith",
            "customer_phone": "07700900000",
            "customer_address": "1 Road, City",
            "device_name": "Apple iPhone 16",
            "network": "Unlocked",
            "device_grade": "good",
            "offered_price": 400,
            "postage_method": "label"
        })
    }

    #[tokio::test]
    async fn test_creates_order_without_storage_check() {
        let h = Harness::new(Arc::new(RandomSuffix::new("TRD")));
        let created = h.service.handle(request(smith())).await.unwrap();
        assert_eq!(created.status, OrderStatus::Received);
        assert_eq!(created.payment_status, PaymentStatus::Pending);
        assert_eq!(h.store.pricing_lookup_count(), 0);

        let order = h
            .store
            .find_by_number(&created.order_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.origin, OrderOrigin::Api);
        assert_eq!(order.device.storage, "Unknown");

        let (store, notifier) = h.finish().await;
        let logs = store.api_log_snapshot();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].success);
        assert_eq!(logs[0].status_code, 201);
        assert_eq!(logs[0].order_number.as_deref(), Some(created.order_number.as_str()));
        // No email supplied
        assert_eq!(notifier.count("order_confirmation"), 0);
    }

    #[tokio::test]
    async fn test_confirmation_sent_when_email_present() {
        let h = Harness::new(Arc::new(RandomSuffix::new("TRD")));
        let mut body = smith();
        body["customer_email"] = json!("j.smith@example.com");
        let created = h.service.handle(request(body)).await.unwrap();

        let (_, notifier) = h.finish().await;
        assert_eq!(
            notifier.sent(),
            vec![("order_confirmation".to_string(), created.order_number)]
        );
    }

    #[tokio::test]
    async fn test_unknown_storage_combination_names_pair() {
        let h = Harness::new(Arc::new(RandomSuffix::new("TRD")));
        let mut body = smith();
        body["storage"] = json!("256GB");
        let err = h.service.handle(request(body)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PricingCombinationInvalid);
        assert!(err.message.contains("Unlocked / 256GB"));
        assert_eq!(h.store.order_count(), 0);

        let (store, _) = h.finish().await;
        let logs = store.api_log_snapshot();
        assert_eq!(logs.len(), 1);
        assert!(!logs[0].success);
        assert_eq!(logs[0].status_code, 400);
    }

    #[tokio::test]
    async fn test_known_storage_combination_accepted() {
        let h = Harness::new(Arc::new(RandomSuffix::new("TRD")));
        let mut body = smith();
        body["storage"] = json!("128GB");
        h.service.handle(request(body)).await.unwrap();
        assert_eq!(h.store.pricing_lookup_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_device_skips_pricing_lookup() {
        let h = Harness::new(Arc::new(RandomSuffix::new("TRD")));
        let mut body = smith();
        body["device_name"] = json!("apple iphone 16");
        body["storage"] = json!("128GB");
        let err = h.service.handle(request(body)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DeviceNotFound);
        assert_eq!(err.http_status().as_u16(), 404);
        assert_eq!(h.store.pricing_lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_fields_create_nothing() {
        let h = Harness::new(Arc::new(RandomSuffix::new("TRD")));
        let err = h
            .service
            .handle(request(json!({ "customer_name": "J Smith" })))
            .await
            .unwrap_err();
        assert_eq!(err.http_status().as_u16(), 422);
        assert!(err.message.contains("device_name"));
        assert_eq!(h.store.order_count(), 0);

        let (store, _) = h.finish().await;
        assert_eq!(store.api_log_snapshot()[0].status_code, 422);
    }

    #[tokio::test]
    async fn test_malformed_body_is_audited() {
        let h = Harness::new(Arc::new(RandomSuffix::new("TRD")));
        let err = h
            .service
            .handle(IngestRequest {
                body: b"{not json".to_vec(),
                ..request(json!({}))
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);

        let (store, _) = h.finish().await;
        let logs = store.api_log_snapshot();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].request_payload.as_deref(), Some("{not json"));
    }

    #[tokio::test]
    async fn test_payout_redacted_in_audit_but_kept_on_order() {
        let h = Harness::new(Arc::new(RandomSuffix::new("TRD")));
        let mut body = smith();
        body["account_number"] = json!("12345678");
        let created = h.service.handle(request(body)).await.unwrap();

        let order = h
            .store
            .find_by_number(&created.order_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.payout.account_number.as_deref(), Some("12345678"));

        let (store, _) = h.finish().await;
        let payload = store.api_log_snapshot()[0].request_payload.clone().unwrap();
        assert!(!payload.contains("12345678"));
    }

    /// Always returns the same number
    struct FixedNumber(&'static str);

    #[async_trait]
    impl OrderNumberGenerator for FixedNumber {
        async fn next(&self) -> StoreResult<String> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_number_collision_retried_then_surfaced() {
        let h = Harness::new(Arc::new(FixedNumber("TRD-FIXED")));
        h.service.handle(request(smith())).await.unwrap();

        let err = h.service.handle(request(smith())).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNumberConflict);
        assert_eq!(h.store.order_count(), 1);

        let (store, _) = h.finish().await;
        let logs = ApiLogStore::list_recent(store.as_ref(), 10, 0).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs.iter().filter(|l| l.success).count(), 1);
    }
}
