//! Payout redaction for stored request payloads

use serde_json::Value;

/// Replacement for redacted values
pub const REDACTED: &str = "[REDACTED]";

const PAYOUT_FIELDS: [&str; 3] = ["bank_name", "account_number", "sort_code"];

/// Mask payout fields in a JSON object body.
///
/// Bodies that are not a JSON object are returned untouched; they never
/// parsed into an order, so there is nothing field-shaped to mask.
pub fn redact_payload(raw: &str) -> String {
    let Ok(Value::Object(mut map)) = serde_json::from_str::<Value>(raw) else {
        return raw.to_string();
    };

    let mut changed = false;
    for field in PAYOUT_FIELDS {
        if let Some(value) = map.get_mut(field)
            && !value.is_null()
        {
            *value = Value::String(REDACTED.into());
            changed = true;
        }
    }

    if !changed {
        return raw.to_string();
    }
    Value::Object(map).to_string()
}
