//! Order number generation
//!
//! Order numbers are the customer-facing business key: prefixed, upper-case
//! and never confusable with the numeric internal id. Uniqueness is finally
//! enforced by the store; generators only make collisions unlikely.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rand::Rng;

use crate::config::OrderNumberStrategy;
use crate::db::{OrderStore, StoreResult};

/// Suffix alphabet without 0/O and 1/I, which customers misread on the phone
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const SUFFIX_LEN: usize = 8;
const SEQUENCE_WIDTH: usize = 5;

#[async_trait]
pub trait OrderNumberGenerator: Send + Sync {
    async fn next(&self) -> StoreResult<String>;
}

/// `PREFIX-XXXXXXXX`
pub struct RandomSuffix {
    prefix: String,
}

impl RandomSuffix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
            .collect();
        format!("{}-{suffix}", self.prefix)
    }
}

#[async_trait]
impl OrderNumberGenerator for RandomSuffix {
    async fn next(&self) -> StoreResult<String> {
        Ok(self.generate())
    }
}

/// `PREFIX-YYYYMMDD-NNNNN`, highest number issued today plus one
pub struct DailySequence {
    prefix: String,
    orders: Arc<dyn OrderStore>,
}

impl DailySequence {
    pub fn new(prefix: impl Into<String>, orders: Arc<dyn OrderStore>) -> Self {
        Self {
            prefix: prefix.into(),
            orders,
        }
    }

    fn day_prefix(&self, date: NaiveDate) -> String {
        format!("{}-{}-", self.prefix, date.format("%Y%m%d"))
    }

    /// Next number for `date`. A day with no orders yet starts at 1.
    pub async fn next_for_date(&self, date: NaiveDate) -> StoreResult<String> {
        let day_prefix = self.day_prefix(date);
        let latest = self.orders.latest_order_number(&day_prefix).await?;

        let seq = latest
            .as_deref()
            .and_then(|n| n.strip_prefix(&day_prefix))
            .and_then(|s| s.parse::<u32>().ok())
            .map_or(1, |s| s + 1);

        Ok(format!("{day_prefix}{seq:0width$}", width = SEQUENCE_WIDTH))
    }
}

#[async_trait]
impl OrderNumberGenerator for DailySequence {
    async fn next(&self) -> StoreResult<String> {
        self.next_for_date(Utc::now().date_naive()).await
    }
}

/// Build the configured generator
pub fn build_generator(
    strategy: OrderNumberStrategy,
    prefix: &str,
    orders: Arc<dyn OrderStore>,
) -> Arc<dyn OrderNumberGenerator> {
    match strategy {
        OrderNumberStrategy::Random => Arc::new(RandomSuffix::new(prefix)),
        OrderNumberStrategy::Daily => Arc::new(DailySequence::new(prefix, orders)),
    }
}
