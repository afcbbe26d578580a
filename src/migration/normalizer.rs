//! Flattening of secret payloads into a single string value.
//!
//! Rules, in priority order:
//! 1. A payload with a `value` field holding a string flattens to that string verbatim.
//! 2. Any other non-empty payload flattens to its compact JSON serialization.
//!
//! An empty payload has no flat value.

use serde_json::Value;

use crate::errors::{MigrationError, Result};
use crate::source::{SecretPath, SecretPayload};

/// Field holding a scalar secret
pub const SCALAR_FIELD: &str = "value";

/// Flatten `payload` read from `path`.
///
/// Returns `Ok(None)` for an empty payload.
///
/// # Errors
///
/// - [`MigrationError::Serialization`] if the payload cannot be serialized
pub fn normalize(path: &SecretPath, payload: &SecretPayload) -> Result<Option<String>> {
    if payload.is_empty() {
        return Ok(None);
    }

    if let Some(Value::String(scalar)) = payload.get(SCALAR_FIELD) {
        return Ok(Some(scalar.clone()));
    }

    serde_json::to_string(payload)
        .map(Some)
        .map_err(|e| MigrationError::serialization(path.key(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> SecretPayload {
        value.as_object().cloned().unwrap()
    }

    fn path() -> SecretPath {
        SecretPath::new("secret", "app/db")
    }

    #[test]
    fn test_scalar_value_is_verbatim() {
        let flat = normalize(&path(), &payload(json!({"value": "pw123"}))).unwrap();
        assert_eq!(flat, Some("pw123".to_string()));
    }

    #[test]
    fn test_scalar_value_with_extra_fields_still_scalar() {
        let flat =
            normalize(&path(), &payload(json!({"value": "pw123", "owner": "team-a"}))).unwrap();
        assert_eq!(flat, Some("pw123".to_string()));
    }

    #[test]
    fn test_scalar_value_is_not_json_escaped() {
        let flat = normalize(&path(), &payload(json!({"value": "line1\n\"quoted\""}))).unwrap();
        assert_eq!(flat, Some("line1\n\"quoted\"".to_string()));
    }

    #[test]
    fn test_structured_blob_round_trips() {
        let expected = payload(json!({"host": "x", "port": "5432"}));
        let flat = normalize(&path(), &expected).unwrap().unwrap();

        let decoded: SecretPayload = serde_json::from_str(&flat).unwrap();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_non_string_value_field_serializes_whole_payload() {
        let expected = payload(json!({"value": 42, "unit": "s"}));
        let flat = normalize(&path(), &expected).unwrap().unwrap();

        let decoded: SecretPayload = serde_json::from_str(&flat).unwrap();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_nested_blob() {
        let expected = payload(json!({"db": {"user": "u", "hosts": ["a", "b"]}, "ttl": 30}));
        let flat = normalize(&path(), &expected).unwrap().unwrap();
        let decoded: SecretPayload = serde_json::from_str(&flat).unwrap();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_empty_payload_has_no_value() {
        assert_eq!(normalize(&path(), &SecretPayload::new()).unwrap(), None);
    }
}
