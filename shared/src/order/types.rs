//! Order value types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where an order came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderOrigin {
    /// Public web form
    Website,
    /// Partner integration through the external gateway
    Api,
}

impl OrderOrigin {
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderOrigin::Website => "WEBSITE",
            OrderOrigin::Api => "API",
        }
    }
}

impl FromStr for OrderOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WEBSITE" => Ok(OrderOrigin::Website),
            "API" => Ok(OrderOrigin::Api),
            other => Err(format!("unknown order origin: {other}")),
        }
    }
}

/// How the device travels to the warehouse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostageMethod {
    /// Prepaid shipping label
    Label,
    /// Prepaid postbag sent to the customer
    Postbag,
}

impl PostageMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            PostageMethod::Label => "label",
            PostageMethod::Postbag => "postbag",
        }
    }
}

impl FromStr for PostageMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "label" => Ok(PostageMethod::Label),
            "postbag" => Ok(PostageMethod::Postbag),
            other => Err(format!("unknown postage method: {other}")),
        }
    }
}

/// Bank details used to pay the customer
///
/// `Debug` is redacted so payout details can never leak through logs.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutDetails {
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub sort_code: Option<String>,
}

impl PayoutDetails {
    pub fn is_empty(&self) -> bool {
        self.bank_name.is_none() && self.account_number.is_none() && self.sort_code.is_none()
    }
}

impl fmt::Debug for PayoutDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<redacted>" } else { "<none>" };
        f.debug_struct("PayoutDetails")
            .field("bank_name", &mask(&self.bank_name))
            .field("account_number", &mask(&self.account_number))
            .field("sort_code", &mask(&self.sort_code))
            .finish()
    }
}
