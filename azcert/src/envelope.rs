//! Unwrapping of the remote's collection envelopes.
//!
//! The backend serializes with reference preservation, so collections arrive
//! as `{"$id": "1", "$values": [...]}`. Some endpoints return a bare array or a
//! bare object instead. Everything is flattened to an ordered sequence.

use crate::domain::Certificate;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

pub const VALUES_FIELD: &str = "$values";

/// Flatten a response body into its elements, preserving order.
pub fn normalize(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(VALUES_FIELD) {
            Some(Value::Array(items)) => items,
            Some(_) => Vec::new(),
            None => vec![Value::Object(map)],
        },
        _ => Vec::new(),
    }
}

/// Normalize and decode, skipping elements that are not valid records.
pub fn decode_all<T: DeserializeOwned>(body: Value) -> Vec<T> {
    normalize(body)
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping malformed record in response: {}", e);
                None
            }
        })
        .collect()
}

pub fn decode_certificates(body: Value) -> Vec<Certificate> {
    decode_all(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CertificateId;
    use serde_json::json;

    #[test]
    fn test_enveloped_array_is_unwrapped_in_order() {
        let a = json!({"id": 1});
        let b = json!({"id": 2});
        let body = json!({"$id": "1", "$values": [a.clone(), b.clone()]});
        assert_eq!(normalize(body), vec![a, b]);
    }

    #[test]
    fn test_bare_object_becomes_single_element() {
        let record = json!({"id": 1, "name": "Ali"});
        assert_eq!(normalize(record.clone()), vec![record]);
    }

    #[test]
    fn test_bare_array_is_unchanged() {
        let items = vec![json!({"id": 3}), json!({"id": 1})];
        assert_eq!(normalize(Value::Array(items.clone())), items);
    }

    #[test]
    fn test_unexpected_shapes_become_empty() {
        assert!(normalize(Value::Null).is_empty());
        assert!(normalize(json!("Login successful")).is_empty());
        assert!(normalize(json!({"$values": null})).is_empty());
        assert!(normalize(json!({"$values": {"id": 1}})).is_empty());
        assert!(normalize(json!({"$values": []})).is_empty());
    }

    #[test]
    fn test_decode_skips_malformed_records() {
        let body = json!({"$values": [
            {"id": 7, "name": "Ali Hassan", "s_N": "CERT-001"},
            {"name": "missing id"},
            {"id": 8, "name": "Mona"}
        ]});

        let certs = decode_certificates(body);
        let ids: Vec<CertificateId> = certs.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![CertificateId(7), CertificateId(8)]);
    }
}
