//! Pricing reports for the staff dashboard

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{Grade, PricingEntry};

use super::engine::PricingEngine;
use crate::db::PricingFilter;
use crate::error::ServiceResult;

/// Best payout for one device display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopPayer {
    pub device_name: String,
    pub max_price: Decimal,
    pub avg_price: Decimal,
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeRange {
    pub grade: Grade,
    pub average: Decimal,
    pub min: Decimal,
    pub max: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkCount {
    pub network: String,
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricingStatistics {
    pub total_entries: usize,
    pub devices: usize,
    pub networks: usize,
    pub storages: usize,
    /// Empty when there are no entries
    pub grades: Vec<GradeRange>,
    /// Most entries first
    pub by_network: Vec<NetworkCount>,
}

fn average(sum: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    (sum / Decimal::from(count)).round_dp(2)
}

fn grade_range(entries: &[PricingEntry], grade: Grade) -> Option<GradeRange> {
    let prices: Vec<Decimal> = entries.iter().map(|e| e.prices.get(grade)).collect();
    let min = prices.iter().min().copied()?;
    let max = prices.iter().max().copied()?;
    Some(GradeRange {
        grade,
        average: average(prices.iter().sum(), prices.len()),
        min,
        max,
    })
}

impl PricingEngine {
    /// Devices grouped by display name, highest `grade` price first.
    /// Ties are broken by name.
    pub async fn top_paying_devices(&self, limit: usize, grade: Grade) -> ServiceResult<Vec<TopPayer>> {
        let entries = self.catalog.list_pricing(&PricingFilter::default()).await?;

        let mut groups: BTreeMap<String, Vec<Decimal>> = BTreeMap::new();
        for entry in &entries {
            groups
                .entry(entry.device_name.clone())
                .or_default()
                .push(entry.prices.get(grade));
        }

        let mut payers: Vec<TopPayer> = groups
            .into_iter()
            .filter_map(|(device_name, prices)| {
                let max_price = prices.iter().max().copied()?;
                Some(TopPayer {
                    device_name,
                    max_price,
                    avg_price: average(prices.iter().sum(), prices.len()),
                    entries: prices.len(),
                })
            })
            .collect();

        payers.sort_by(|a, b| {
            b.max_price
                .cmp(&a.max_price)
                .then_with(|| a.device_name.cmp(&b.device_name))
        });
        payers.truncate(limit);
        Ok(payers)
    }

    pub async fn statistics(&self) -> ServiceResult<PricingStatistics> {
        let entries = self.catalog.list_pricing(&PricingFilter::default()).await?;

        let devices: HashSet<i64> = entries.iter().map(|e| e.device_id).collect();
        let storages: HashSet<&str> = entries.iter().map(|e| e.storage.as_str()).collect();

        let mut per_network: BTreeMap<&str, usize> = BTreeMap::new();
        for entry in &entries {
            *per_network.entry(entry.network.as_str()).or_default() += 1;
        }
        let mut by_network: Vec<NetworkCount> = per_network
            .into_iter()
            .map(|(network, entries)| NetworkCount {
                network: network.to_string(),
                entries,
            })
            .collect();
        by_network.sort_by(|a, b| b.entries.cmp(&a.entries).then_with(|| a.network.cmp(&b.network)));

        Ok(PricingStatistics {
            total_entries: entries.len(),
            devices: devices.len(),
            networks: by_network.len(),
            storages: storages.len(),
            grades: Grade::ALL
                .into_iter()
                .filter_map(|g| grade_range(&entries, g))
                .collect(),
            by_network,
        })
    }
}
