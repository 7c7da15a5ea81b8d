//! External order payload and field validation
//!
//! Checks here need no store access and run before any catalog lookup.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use shared::models::{Grade, MAX_PRICE, PRICE_SCALE, UNKNOWN_STORAGE, is_storable_price};
use shared::order::{PayoutDetails, PostageMethod};

/// Body of `POST /api/external/orders`
///
/// Every field is optional at the serde level so that missing fields can be
/// reported together instead of failing on the first one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalOrderPayload {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    pub device_name: Option<String>,
    /// Partner-side device reference, informational only
    pub device_id: Option<Value>,
    pub network: Option<String>,
    pub storage: Option<String>,
    pub device_grade: Option<String>,
    /// Number or numeric string
    pub offered_price: Option<Value>,
    pub postage_method: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub sort_code: Option<String>,
    pub transaction_id: Option<String>,
}

/// Payload after presence and format checks
#[derive(Debug, Clone)]
pub struct ValidatedPayload {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub customer_address: String,
    pub device_name: String,
    pub network: String,
    /// `None` when the caller did not supply one
    pub storage: Option<String>,
    pub grade: Grade,
    pub offered_price: Decimal,
    pub postage_method: PostageMethod,
    pub payout: PayoutDetails,
    pub transaction_id: Option<String>,
}

impl ValidatedPayload {
    /// Storage label written to the order
    pub fn storage_label(&self) -> &str {
        self.storage.as_deref().unwrap_or(UNKNOWN_STORAGE)
    }
}

/// Trimmed, non-blank value
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn optional(value: Option<String>) -> Option<String> {
    present(&value).map(str::to_string)
}

fn price_present(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

/// Parse a non-negative decimal from a JSON number or numeric string
pub fn parse_price(value: &Value) -> Result<Decimal, AppError> {
    let parsed = match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text))
        }
        Value::String(s) => Decimal::from_str(s.trim()),
        _ => {
            return Err(AppError::with_message(
                ErrorCode::InvalidFormat,
                "offered_price must be a number",
            ));
        }
    };

    let price = parsed.map_err(|_| {
        AppError::with_message(ErrorCode::InvalidFormat, "offered_price must be a number")
            .with_detail("offered_price", value.clone())
    })?;

    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "offered_price must not be negative",
        )
        .with_detail("offered_price", price.to_string()));
    }
    if !is_storable_price(price) {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("offered_price must have at most {PRICE_SCALE} decimal places and not exceed {MAX_PRICE}"),
        )
        .with_detail("offered_price", price.to_string()));
    }
    Ok(price.normalize())
}

impl ExternalOrderPayload {
    /// Required fields that are absent or blank, in declaration order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let checks: [(&'static str, bool); 8] = [
            ("customer_name", present(&self.customer_name).is_some()),
            ("customer_phone", present(&self.customer_phone).is_some()),
            ("customer_address", present(&self.customer_address).is_some()),
            ("device_name", present(&self.device_name).is_some()),
            ("network", present(&self.network).is_some()),
            ("device_grade", present(&self.device_grade).is_some()),
            ("offered_price", price_present(&self.offered_price)),
            ("postage_method", present(&self.postage_method).is_some()),
        ];
        checks
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| name)
            .collect()
    }

    /// Presence first, then postage method, grade and price formats
    pub fn validate(self) -> Result<ValidatedPayload, AppError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::missing_fields(&missing));
        }

        // Presence was checked above; these only fail on a logic error
        let required = |value: &Option<String>, name: &str| {
            present(value)
                .map(str::to_string)
                .ok_or_else(|| AppError::missing_fields(&[name]))
        };

        let postage_raw = required(&self.postage_method, "postage_method")?;
        let postage_method = postage_raw.parse::<PostageMethod>().map_err(|_| {
            AppError::with_message(
                ErrorCode::InvalidPostageMethod,
                format!("Invalid postage_method '{postage_raw}' (expected label or postbag)"),
            )
            .with_detail("postage_method", postage_raw.clone())
        })?;

        let grade_raw = required(&self.device_grade, "device_grade")?;
        let grade = grade_raw.parse::<Grade>().map_err(|e| {
            AppError::with_message(ErrorCode::InvalidGrade, e.to_string())
                .with_detail("device_grade", grade_raw.clone())
        })?;

        let offered_price = match &self.offered_price {
            Some(value) => parse_price(value)?,
            None => return Err(AppError::missing_fields(&["offered_price"])),
        };

        Ok(ValidatedPayload {
            customer_name: required(&self.customer_name, "customer_name")?,
            customer_phone: required(&self.customer_phone, "customer_phone")?,
            customer_address: required(&self.customer_address, "customer_address")?,
            device_name: required(&self.device_name, "device_name")?,
            network: required(&self.network, "network")?,
            storage: optional(self.storage),
            grade,
            offered_price,
            postage_method,
            customer_email: optional(self.customer_email),
            payout: PayoutDetails {
                bank_name: optional(self.bank_name),
                account_number: optional(self.account_number),
                sort_code: optional(self.sort_code),
            },
            transaction_id: optional(self.transaction_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> ExternalOrderPayload {
        serde_json::from_value(value).unwrap()
    }

    fn valid() -> Value {
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

    #[test]
    fn test_valid_payload_normalizes() {
        let v = payload(valid()).validate().unwrap();
        assert_eq!(v.grade, Grade::Good);
        assert_eq!(v.offered_price, Decimal::from(400));
        assert_eq!(v.postage_method, PostageMethod::Label);
        assert_eq!(v.storage, None);
        assert_eq!(v.storage_label(), "Unknown");
        assert!(v.payout.is_empty());
    }

    #[test]
    fn test_every_missing_field_is_listed() {
        let err = payload(json!({ "customer_name": "J Smith", "network": "  " }))
            .validate()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);
        let listed = &err.details.as_ref().unwrap()["missing_fields"];
        assert_eq!(
            listed,
            &json!([
                "customer_phone",
                "customer_address",
                "device_name",
                "network",
                "device_grade",
                "offered_price",
                "postage_method"
            ])
        );
    }

    #[test]
    fn test_blank_price_string_counts_as_missing() {
        let mut body = valid();
        body["offered_price"] = json!(" ");
        assert_eq!(payload(body).missing_fields(), vec!["offered_price"]);
    }

    #[test]
    fn test_price_accepts_numeric_string() {
        let mut body = valid();
        body["offered_price"] = json!("399.50");
        let v = payload(body).validate().unwrap();
        assert_eq!(v.offered_price, Decimal::new(39950, 2));
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut body = valid();
        body["offered_price"] = json!(-1);
        let err = payload(body).validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
    }

    #[test]
    fn test_price_beyond_column_range_rejected() {
        let mut body = valid();
        body["offered_price"] = json!(12345678901_i64);
        assert_eq!(payload(body).validate().unwrap_err().code, ErrorCode::ValueOutOfRange);

        let mut body = valid();
        body["offered_price"] = json!("400.125");
        assert_eq!(payload(body).validate().unwrap_err().code, ErrorCode::ValueOutOfRange);

        let mut body = valid();
        body["offered_price"] = json!("400.100");
        assert_eq!(
            payload(body).validate().unwrap().offered_price,
            Decimal::new(4001, 1)
        );
    }

    #[test]
    fn test_non_numeric_price_rejected() {
        let mut body = valid();
        body["offered_price"] = json!("four hundred");
        assert_eq!(payload(body).validate().unwrap_err().code, ErrorCode::InvalidFormat);

        let mut body = valid();
        body["offered_price"] = json!(true);
        assert_eq!(payload(body).validate().unwrap_err().code, ErrorCode::InvalidFormat);
    }

    #[test]
    fn test_invalid_postage_method_rejected() {
        let mut body = valid();
        body["postage_method"] = json!("courier");
        let err = payload(body).validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPostageMethod);
    }

    #[test]
    fn test_invalid_grade_rejected() {
        let mut body = valid();
        body["device_grade"] = json!("mint");
        assert_eq!(payload(body).validate().unwrap_err().code, ErrorCode::InvalidGrade);
    }

    #[test]
    fn test_payout_only_from_supplied_fields() {
        let mut body = valid();
        body["bank_name"] = json!("Big Bank");
        body["sort_code"] = json!("");
        let v = payload(body).validate().unwrap();
        assert_eq!(v.payout.bank_name.as_deref(), Some("Big Bank"));
        assert_eq!(v.payout.account_number, None);
        assert_eq!(v.payout.sort_code, None);
    }
}
