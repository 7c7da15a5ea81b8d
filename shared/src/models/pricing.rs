//! Pricing model
//!
//! One [`PricingEntry`] per (device, network, storage) triple, carrying a price
//! for every [`Grade`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage label used when the customer did not specify one
pub const UNKNOWN_STORAGE: &str = "Unknown";

/// Decimal places kept for any price
pub const PRICE_SCALE: u32 = 2;

/// Largest price a `NUMERIC(12, 2)` column holds: 9999999999.99
pub const MAX_PRICE: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, PRICE_SCALE);

/// Non-negative, at most [`PRICE_SCALE`] decimals and no larger than [`MAX_PRICE`]
pub fn is_storable_price(value: Decimal) -> bool {
    (!value.is_sign_negative() || value.is_zero())
        && value.normalize().scale() <= PRICE_SCALE
        && value <= MAX_PRICE
}

/// Device condition tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Grade {
    New,
    Good,
    Broken,
}

impl Grade {
    pub const ALL: [Grade; 3] = [Grade::New, Grade::Good, Grade::Broken];

    pub const fn as_str(self) -> &'static str {
        match self {
            Grade::New => "NEW",
            Grade::Good => "GOOD",
            Grade::Broken => "BROKEN",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown grade name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid grade: {0} (expected NEW, GOOD or BROKEN)")]
pub struct InvalidGrade(pub String);

impl FromStr for Grade {
    type Err = InvalidGrade;

    /// Case-insensitive: the input is upper-cased before matching
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NEW" => Ok(Grade::New),
            "GOOD" => Ok(Grade::Good),
            "BROKEN" => Ok(Grade::Broken),
            _ => Err(InvalidGrade(s.to_string())),
        }
    }
}

/// Price per grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GradePrices {
    pub price_new: Decimal,
    pub price_good: Decimal,
    pub price_broken: Decimal,
}

impl GradePrices {
    pub fn new(price_new: Decimal, price_good: Decimal, price_broken: Decimal) -> Self {
        Self {
            price_new,
            price_good,
            price_broken,
        }
    }

    pub fn get(&self, grade: Grade) -> Decimal {
        match grade {
            Grade::New => self.price_new,
            Grade::Good => self.price_good,
            Grade::Broken => self.price_broken,
        }
    }

    /// Apply `f` to every grade price; `None` as soon as one result is `None`
    pub fn try_map(self, f: impl Fn(Decimal) -> Option<Decimal>) -> Option<Self> {
        Some(Self {
            price_new: f(self.price_new)?,
            price_good: f(self.price_good)?,
            price_broken: f(self.price_broken)?,
        })
    }
}

/// Quote table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingEntry {
    pub id: i64,
    pub device_id: i64,
    /// Denormalized device display name (reporting)
    pub device_name: String,
    pub network: String,
    pub storage: String,
    #[serde(flatten)]
    pub prices: GradePrices,
    /// Unix millis
    pub updated_at: i64,
}
