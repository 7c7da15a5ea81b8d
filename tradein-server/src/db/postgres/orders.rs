//! Order queries

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{CustomerContact, DeviceSnapshot, Order};
use shared::order::PayoutDetails;

use super::{PgStore, map_unique};
use crate::db::{OrderStore, StoreError, StoreResult};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    origin: String,
    status: String,
    customer_name: String,
    customer_phone: String,
    customer_email: Option<String>,
    customer_address: String,
    device_name: String,
    device_network: String,
    device_grade: String,
    device_storage: String,
    offered_price: Decimal,
    final_price: Option<Decimal>,
    postage_method: String,
    bank_name: Option<String>,
    account_number: Option<String>,
    sort_code: Option<String>,
    transaction_id: Option<String>,
    price_revision_reason: Option<String>,
    notes: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl OrderRow {
    fn into_order(self) -> StoreResult<Order> {
        let corrupt = |field: &str, value: &str| {
            StoreError::Corrupt(format!(
                "order {}: invalid {field} '{value}'",
                self.order_number
            ))
        };

        Ok(Order {
            id: self.id,
            origin: self.origin.parse().map_err(|_| corrupt("origin", &self.origin))?,
            status: self.status.parse().map_err(|_| corrupt("status", &self.status))?,
            customer: CustomerContact {
                name: self.customer_name,
                phone: self.customer_phone,
                email: self.customer_email,
                address: self.customer_address,
            },
            device: DeviceSnapshot {
                name: self.device_name,
                network: self.device_network,
                grade: self
                    .device_grade
                    .parse()
                    .map_err(|_| corrupt("device_grade", &self.device_grade))?,
                storage: self.device_storage,
            },
            offered_price: self.offered_price,
            final_price: self.final_price,
            postage_method: self
                .postage_method
                .parse()
                .map_err(|_| corrupt("postage_method", &self.postage_method))?,
            payout: PayoutDetails {
                bank_name: self.bank_name,
                account_number: self.account_number,
                sort_code: self.sort_code,
            },
            transaction_id: self.transaction_id,
            price_revision_reason: self.price_revision_reason,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
            order_number: self.order_number,
        })
    }
}

const ORDER_COLUMNS: &str = "id, order_number, origin, status, customer_name, customer_phone, customer_email, customer_address, device_name, device_network, device_grade, device_storage, offered_price, final_price, postage_method, bank_name, account_number, sort_code, transaction_id, price_revision_reason, notes, created_at, updated_at";

#[async_trait]
impl OrderStore for PgStore {
    async fn insert(&self, order: &Order) -> StoreResult<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO orders ({ORDER_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)
            "#
        ))
        .bind(order.id)
        .bind(&order.order_number)
        .bind(order.origin.as_str())
        .bind(order.status.as_str())
        .bind(&order.customer.name)
        .bind(&order.customer.phone)
        .bind(&order.customer.email)
        .bind(&order.customer.address)
        .bind(&order.device.name)
        .bind(&order.device.network)
        .bind(order.device.grade.as_str())
        .bind(&order.device.storage)
        .bind(order.offered_price)
        .bind(order.final_price)
        .bind(order.postage_method.as_str())
        .bind(&order.payout.bank_name)
        .bind(&order.payout.account_number)
        .bind(&order.payout.sort_code)
        .bind(&order.transaction_id)
        .bind(&order.price_revision_reason)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, || format!("order number {} already exists", order.order_number)))?;
        Ok(())
    }

    async fn find_by_number(&self, order_number: &str) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1"))
                .bind(order_number)
                .fetch_optional(&self.pool)
                .await?;
        row.map(OrderRow::into_order).transpose()
    }

    async fn update(&self, order: &Order) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = $1, customer_name = $2, customer_phone = $3, customer_email = $4,
                customer_address = $5, final_price = $6, bank_name = $7, account_number = $8,
                sort_code = $9, transaction_id = $10, price_revision_reason = $11, notes = $12,
                updated_at = $13
            WHERE order_number = $14
            "#,
        )
        .bind(order.status.as_str())
        .bind(&order.customer.name)
        .bind(&order.customer.phone)
        .bind(&order.customer.email)
        .bind(&order.customer.address)
        .bind(order.final_price)
        .bind(&order.payout.bank_name)
        .bind(&order.payout.account_number)
        .bind(&order.payout.sort_code)
        .bind(&order.transaction_id)
        .bind(&order.price_revision_reason)
        .bind(&order.notes)
        .bind(order.updated_at)
        .bind(&order.order_number)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(order.order_number.clone()));
        }
        Ok(())
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn latest_order_number(&self, prefix: &str) -> StoreResult<Option<String>> {
        let number: Option<String> = sqlx::query_scalar(
            "SELECT order_number FROM orders WHERE starts_with(order_number, $1) ORDER BY length(order_number) DESC, order_number DESC LIMIT 1",
        )
        .bind(prefix)
        .fetch_optional(&self.pool)
        .await?;
        Ok(number)
    }
}
