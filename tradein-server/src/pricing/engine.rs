//! Quote, bulk adjust, gap detection and cloning

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Device, Grade, GradePrices, PricingEntry, is_storable_price};
use shared::util::{now_millis, snowflake_id};

use crate::db::{CatalogStore, PricingFilter};
use crate::error::ServiceResult;

/// Resolved price for one device configuration
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub device_id: i64,
    pub device_name: String,
    pub network: String,
    pub storage: String,
    pub grade: Grade,
    pub price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkAdjustResult {
    pub matched: u64,
    pub modified: u64,
}

/// Expected (network, storage) pair with no pricing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricingGap {
    pub network: String,
    pub storage: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CloneResult {
    pub entries_cloned: u64,
}

/// Round to the nearest whole unit, halves away from zero
pub(crate) fn round_unit(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Multiply and round every grade price, rejecting results that overflow or
/// fall outside the storable range
fn scale_prices(prices: GradePrices, factor: Decimal) -> Result<GradePrices, AppError> {
    prices
        .try_map(|p| {
            p.checked_mul(factor)
                .map(round_unit)
                .filter(|scaled| is_storable_price(*scaled))
        })
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::ValueOutOfRange,
                "adjusted price exceeds the supported range",
            )
            .with_detail("factor", factor.to_string())
        })
}

#[derive(Clone)]
pub struct PricingEngine {
    pub(super) catalog: Arc<dyn CatalogStore>,
}

impl PricingEngine {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    async fn device(&self, device_id: i64) -> ServiceResult<Device> {
        self.catalog.find_device(device_id).await?.ok_or_else(|| {
            AppError::with_message(
                ErrorCode::DeviceNotFound,
                format!("Device {device_id} not found"),
            )
            .into()
        })
    }

    /// Price for a device configuration and grade. The grade is checked first,
    /// then the device must exist and be active.
    pub async fn quote(
        &self,
        device_id: i64,
        network: &str,
        storage: &str,
        grade: &str,
    ) -> ServiceResult<Quote> {
        let grade = grade.parse::<Grade>().map_err(|e| {
            AppError::with_message(ErrorCode::InvalidGrade, e.to_string())
                .with_detail("grade", grade.to_string())
        })?;

        let device = self.device(device_id).await?;
        if !device.is_active {
            return Err(AppError::with_message(
                ErrorCode::DeviceNotFound,
                format!("Device {device_id} is not active"),
            )
            .into());
        }

        let entry = self
            .catalog
            .find_pricing(device_id, network, storage)
            .await?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::PricingNotFound,
                    format!("No pricing for device {device_id}: {network} / {storage}"),
                )
                .with_detail("device_id", device_id)
                .with_detail("network", network.to_string())
                .with_detail("storage", storage.to_string())
            })?;

        Ok(Quote {
            price: entry.prices.get(grade),
            device_id: entry.device_id,
            device_name: entry.device_name,
            network: entry.network,
            storage: entry.storage,
            grade,
        })
    }

    /// Multiply every grade price of the matching entries by `1 + percent/100`
    pub async fn bulk_adjust(
        &self,
        filter: &PricingFilter,
        percent: Decimal,
    ) -> ServiceResult<BulkAdjustResult> {
        if percent <= -Decimal::ONE_HUNDRED {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                "percent must be greater than -100",
            )
            .with_detail("percent", percent.to_string())
            .into());
        }

        let factor = Decimal::ONE + percent / Decimal::ONE_HUNDRED;
        let entries = self.catalog.list_pricing(filter).await?;
        let updates = entries
            .iter()
            .map(|e| Ok((e.id, scale_prices(e.prices, factor)?)))
            .collect::<Result<Vec<(i64, GradePrices)>, AppError>>()?;

        let modified = self.catalog.update_prices(&updates, now_millis()).await?;
        tracing::info!(
            %percent,
            matched = entries.len(),
            modified,
            "Bulk price adjustment applied"
        );
        Ok(BulkAdjustResult {
            matched: entries.len() as u64,
            modified,
        })
    }

    /// Expected combinations missing from the device's pricing, in
    /// network-major order
    pub async fn find_gaps(
        &self,
        device_id: i64,
        networks: &[String],
        storages: &[String],
    ) -> ServiceResult<Vec<PricingGap>> {
        self.device(device_id).await?;

        let existing: HashSet<(String, String)> = self
            .catalog
            .list_pricing(&PricingFilter::for_device(device_id))
            .await?
            .into_iter()
            .map(|e| (e.network, e.storage))
            .collect();

        let mut seen = HashSet::new();
        let mut gaps = Vec::new();
        for network in networks {
            for storage in storages {
                let key = (network.clone(), storage.clone());
                if existing.contains(&key) || !seen.insert(key) {
                    continue;
                }
                gaps.push(PricingGap {
                    network: network.clone(),
                    storage: storage.clone(),
                });
            }
        }
        Ok(gaps)
    }

    /// Replace the target device's pricing with the source's, scaled by
    /// `multiplier`. Destructive on the target.
    pub async fn clone_pricing(
        &self,
        source_id: i64,
        target_id: i64,
        multiplier: Decimal,
    ) -> ServiceResult<CloneResult> {
        if source_id == target_id {
            return Err(AppError::validation("source and target device must differ").into());
        }
        if multiplier <= Decimal::ZERO {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                "multiplier must be greater than 0",
            )
            .with_detail("multiplier", multiplier.to_string())
            .into());
        }

        self.device(source_id).await?;
        let target = self.device(target_id).await?;

        let now = now_millis();
        let cloned = self
            .catalog
            .list_pricing(&PricingFilter::for_device(source_id))
            .await?
            .into_iter()
            .map(|e| {
                Ok(PricingEntry {
                    id: snowflake_id(),
                    device_id: target.id,
                    device_name: target.full_name.clone(),
                    network: e.network,
                    storage: e.storage,
                    prices: scale_prices(e.prices, multiplier)?,
                    updated_at: now,
                })
            })
            .collect::<Result<Vec<PricingEntry>, AppError>>()?;

        let entries_cloned = self
            .catalog
            .replace_device_pricing(target.id, &cloned)
            .await?;
        tracing::info!(
            source_id,
            target_id,
            %multiplier,
            entries_cloned,
            "Device pricing cloned"
        );
        Ok(CloneResult { entries_cloned })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    pub(crate) fn device(id: i64, full_name: &str) -> Device {
        Device {
            id,
            brand: full_name.split(' ').next().unwrap_or_default().into(),
            model: full_name.into(),
            full_name: full_name.into(),
            category: "phone".into(),
            is_active: true,
        }
    }

    pub(crate) fn entry(
        id: i64,
        device_id: i64,
        device_name: &str,
        network: &str,
        storage: &str,
        prices: [i64; 3],
    ) -> PricingEntry {
        PricingEntry {
            id,
            device_id,
            device_name: device_name.into(),
            network: network.into(),
            storage: storage.into(),
            prices: GradePrices::new(
                Decimal::from(prices[0]),
                Decimal::from(prices[1]),
                Decimal::from(prices[2]),
            ),
            updated_at: 0,
        }
    }

    pub(crate) fn catalog() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.put_device(device(16, "Apple iPhone 16"));
        store.put_device(device(17, "Apple iPhone 16 Pro"));
        store.put_device(device(24, "Samsung Galaxy S24"));
        store.put_pricing(entry(1, 16, "Apple iPhone 16", "Unlocked", "128GB", [520, 400, 90]));
        store.put_pricing(entry(2, 16, "Apple iPhone 16", "EE", "128GB", [505, 385, 85]));
        store.put_pricing(entry(3, 24, "Samsung Galaxy S24", "Unlocked", "256GB", [455, 333, 71]));
        store
    }

    #[tokio::test]
    async fn test_quote_resolves_grade_price() {
        let engine = PricingEngine::new(catalog());
        let quote = engine.quote(16, "Unlocked", "128GB", "good").await.unwrap();
        assert_eq!(quote.price, Decimal::from(400));
        assert_eq!(quote.grade, Grade::Good);
    }

    #[tokio::test]
    async fn test_quote_missing_entry_is_not_found() {
        let engine = PricingEngine::new(catalog());
        let err = engine.quote(16, "Unlocked", "256GB", "NEW").await.unwrap_err();
        assert_eq!(AppError::from(err).code, ErrorCode::PricingNotFound);
    }

    #[tokio::test]
    async fn test_quote_checks_grade_before_lookup() {
        let store = catalog();
        let engine = PricingEngine::new(store.clone());
        let err = engine.quote(16, "Unlocked", "128GB", "mint").await.unwrap_err();
        assert_eq!(AppError::from(err).code, ErrorCode::InvalidGrade);
        assert_eq!(store.pricing_lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_quote_requires_active_device() {
        let store = catalog();
        let engine = PricingEngine::new(store.clone());
        let err = engine.quote(99, "Unlocked", "128GB", "NEW").await.unwrap_err();
        assert_eq!(AppError::from(err).code, ErrorCode::DeviceNotFound);

        store.put_device(Device {
            is_active: false,
            ..device(16, "Apple iPhone 16")
        });
        let err = engine.quote(16, "Unlocked", "128GB", "NEW").await.unwrap_err();
        assert_eq!(AppError::from(err).code, ErrorCode::DeviceNotFound);
        assert_eq!(store.pricing_lookup_count(), 0);
    }

    async fn prices_of(store: &MemoryStore, id: i64) -> GradePrices {
        store
            .list_pricing(&PricingFilter::default())
            .await
            .unwrap()
            .into_iter()
            .find(|e| e.id == id)
            .unwrap()
            .prices
    }

    #[tokio::test]
    async fn test_bulk_adjust_everything_by_ten_percent() {
        let store = catalog();
        let engine = PricingEngine::new(store.clone());
        let result = engine
            .bulk_adjust(&PricingFilter::default(), Decimal::from(10))
            .await
            .unwrap();
        assert_eq!(result, BulkAdjustResult { matched: 3, modified: 3 });

        assert_eq!(
            prices_of(&store, 1).await,
            GradePrices::new(Decimal::from(572), Decimal::from(440), Decimal::from(99))
        );
        // 333 * 1.1 = 366.3 and 71 * 1.1 = 78.1
        assert_eq!(
            prices_of(&store, 3).await,
            GradePrices::new(Decimal::from(501), Decimal::from(366), Decimal::from(78))
        );
    }

    #[tokio::test]
    async fn test_bulk_adjust_filter_is_conjunctive() {
        let engine = PricingEngine::new(catalog());
        let filter = PricingFilter {
            device_id: Some(16),
            network: Some("EE".into()),
            storage: None,
        };
        let result = engine.bulk_adjust(&filter, Decimal::from(-5)).await.unwrap();
        assert_eq!(result.matched, 1);
    }

    #[tokio::test]
    async fn test_bulk_adjust_rejects_wipeout() {
        let engine = PricingEngine::new(catalog());
        let err = engine
            .bulk_adjust(&PricingFilter::default(), Decimal::from(-100))
            .await
            .unwrap_err();
        assert_eq!(AppError::from(err).code, ErrorCode::ValueOutOfRange);
    }

    #[tokio::test]
    async fn test_bulk_adjust_overflow_is_out_of_range() {
        let store = catalog();
        let engine = PricingEngine::new(store.clone());
        let huge = Decimal::from_str_exact("70000000000000000000000000000").unwrap();
        let err = engine
            .bulk_adjust(&PricingFilter::default(), huge)
            .await
            .unwrap_err();
        assert_eq!(AppError::from(err).code, ErrorCode::ValueOutOfRange);
        assert_eq!(
            prices_of(&store, 1).await,
            GradePrices::new(Decimal::from(520), Decimal::from(400), Decimal::from(90))
        );

        // No overflow, but past what a price column holds
        let err = engine
            .bulk_adjust(&PricingFilter::default(), Decimal::from(10_000_000_000_i64))
            .await
            .unwrap_err();
        assert_eq!(AppError::from(err).code, ErrorCode::ValueOutOfRange);
    }

    #[tokio::test]
    async fn test_find_gaps_in_cartesian_order() {
        let engine = PricingEngine::new(catalog());
        let networks = vec!["Unlocked".to_string(), "EE".to_string(), "O2".to_string()];
        let storages = vec!["128GB".to_string(), "256GB".to_string()];
        let gaps = engine.find_gaps(16, &networks, &storages).await.unwrap();
        let pairs: Vec<(&str, &str)> = gaps
            .iter()
            .map(|g| (g.network.as_str(), g.storage.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Unlocked", "256GB"),
                ("EE", "256GB"),
                ("O2", "128GB"),
                ("O2", "256GB"),
            ]
        );
    }

    #[tokio::test]
    async fn test_find_gaps_unknown_device() {
        let engine = PricingEngine::new(catalog());
        let err = engine.find_gaps(99, &[], &[]).await.unwrap_err();
        assert_eq!(AppError::from(err).code, ErrorCode::DeviceNotFound);
    }

    #[tokio::test]
    async fn test_clone_replaces_target_pricing() {
        let store = catalog();
        store.put_pricing(entry(9, 17, "stale name", "Vodafone", "1TB", [1, 1, 1]));
        let engine = PricingEngine::new(store.clone());

        let result = engine
            .clone_pricing(16, 17, Decimal::new(115, 2))
            .await
            .unwrap();
        assert_eq!(result.entries_cloned, 2);

        let target = store
            .list_pricing(&PricingFilter::for_device(17))
            .await
            .unwrap();
        assert_eq!(target.len(), 2);
        assert!(target.iter().all(|e| e.device_name == "Apple iPhone 16 Pro"));
        let unlocked = target.iter().find(|e| e.network == "Unlocked").unwrap();
        // 520 * 1.15 = 598, 400 * 1.15 = 460, 90 * 1.15 = 103.5
        assert_eq!(
            unlocked.prices,
            GradePrices::new(Decimal::from(598), Decimal::from(460), Decimal::from(104))
        );

        // Source untouched
        assert_eq!(
            store
                .list_pricing(&PricingFilter::for_device(16))
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_clone_rejects_bad_arguments() {
        let engine = PricingEngine::new(catalog());
        let same = engine.clone_pricing(16, 16, Decimal::ONE).await.unwrap_err();
        assert_eq!(AppError::from(same).code, ErrorCode::ValidationFailed);

        let zero = engine.clone_pricing(16, 17, Decimal::ZERO).await.unwrap_err();
        assert_eq!(AppError::from(zero).code, ErrorCode::ValueOutOfRange);

        let missing = engine.clone_pricing(16, 99, Decimal::ONE).await.unwrap_err();
        assert_eq!(AppError::from(missing).code, ErrorCode::DeviceNotFound);
    }

    #[tokio::test]
    async fn test_clone_overflow_leaves_target_untouched() {
        let store = catalog();
        store.put_pricing(entry(9, 17, "Apple iPhone 16 Pro", "Vodafone", "1TB", [700, 600, 100]));
        let engine = PricingEngine::new(store.clone());

        let huge = Decimal::from_str_exact("70000000000000000000000000000").unwrap();
        let err = engine.clone_pricing(16, 17, huge).await.unwrap_err();
        assert_eq!(AppError::from(err).code, ErrorCode::ValueOutOfRange);

        let target = store
            .list_pricing(&PricingFilter::for_device(17))
            .await
            .unwrap();
        assert_eq!(target.len(), 1);
        assert_eq!(target[0].id, 9);
    }
}
