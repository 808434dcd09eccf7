//! JSON merge patch (RFC 7396)

use serde_json::{Map, Value};

/// Merge `patch` into `target`: objects merge key by key, `null` removes a
/// key, anything else replaces.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(target) = target {
        for (key, value) in patch {
            if value.is_null() {
                target.remove(key);
            } else {
                merge_patch(target.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_patch() {
        let mut doc = json!({ "title": "RRR", "watched": false, "meta": { "a": 1, "b": 2 } });
        merge_patch(&mut doc, &json!({ "watched": true, "meta": { "b": null, "c": 3 } }));
        assert_eq!(doc, json!({ "title": "RRR", "watched": true, "meta": { "a": 1, "c": 3 } }));
    }

    #[test]
    fn test_non_object_patch_replaces() {
        let mut doc = json!({ "a": 1 });
        merge_patch(&mut doc, &json!([1, 2]));
        assert_eq!(doc, json!([1, 2]));
    }
}
