//! Canonical JSON encoding

use serde_json::{Map, Value};

/// Compact JSON with sorted object keys, no nulls and no empty containers.
///
/// An omitted optional field, an explicit null, an empty list and an empty
/// object all encode the same way, so they cannot split cache keys.
pub fn canonical_json(value: &Value) -> String {
    normalize(value)
        .map(|v| v.to_string())
        .unwrap_or_else(|| "null".to_string())
}

fn normalize(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Array(items) => {
            let items: Vec<Value> = items
                .iter()
                .map(|item| normalize(item).unwrap_or(Value::Null))
                .collect();
            (!items.is_empty()).then_some(Value::Array(items))
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, Value)> = map
                .iter()
                .filter_map(|(k, v)| normalize(v).map(|v| (k, v)))
                .collect();
            if entries.is_empty() {
                return None;
            }
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k.clone(), v);
            }
            Some(Value::Object(sorted))
        }
        other => Some(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_sorted_and_compact() {
        let value = json!({"b": 1, "a": {"d": true, "c": "x"}});
        assert_eq!(canonical_json(&value), r#"{"a":{"c":"x","d":true},"b":1}"#);
    }

    #[test]
    fn test_null_and_empty_are_omitted() {
        let with_nulls = json!({"a": 1, "b": null, "c": [], "d": {}});
        let without = json!({"a": 1});
        assert_eq!(canonical_json(&with_nulls), canonical_json(&without));
    }

    #[test]
    fn test_array_order_is_significant() {
        assert_ne!(
            canonical_json(&json!(["x", "y"])),
            canonical_json(&json!(["y", "x"]))
        );
    }

    #[test]
    fn test_null_inside_array_keeps_position() {
        assert_eq!(canonical_json(&json!([null, 1])), "[null,1]");
    }
}
