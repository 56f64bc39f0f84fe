//! 审计差异计算
//!
//! 序列化新旧对象并提取变更字段，供审计详情记录。

use serde::Serialize;
use serde_json::{Value, json};

/// Compute a field-level diff between two serializable snapshots.
///
/// Returns `{"entity": label, "changes": {field: {"from": .., "to": ..}}}`.
/// Non-object values fall back to a whole-value comparison.
pub fn create_diff<T: Serialize>(old: &T, new: &T, label: &str) -> Value {
    let old_value = serde_json::to_value(old).unwrap_or(Value::Null);
    let new_value = serde_json::to_value(new).unwrap_or(Value::Null);

    let changes = match (&old_value, &new_value) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            let mut changes = serde_json::Map::new();
            for (key, new_field) in new_map {
                let old_field = old_map.get(key).unwrap_or(&Value::Null);
                if old_field != new_field {
                    changes.insert(
                        key.clone(),
                        json!({ "from": old_field, "to": new_field }),
                    );
                }
            }
            for (key, old_field) in old_map {
                if !new_map.contains_key(key) {
                    changes.insert(key.clone(), json!({ "from": old_field, "to": Value::Null }));
                }
            }
            Value::Object(changes)
        }
        _ if old_value != new_value => json!({ "value": { "from": old_value, "to": new_value } }),
        _ => json!({}),
    };

    json!({ "entity": label, "changes": changes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Thing {
        name: String,
        qty: i64,
    }

    #[test]
    fn diff_picks_changed_fields_only() {
        let old = Thing {
            name: "a".into(),
            qty: 1,
        };
        let new = Thing {
            name: "a".into(),
            qty: 2,
        };
        let diff = create_diff(&old, &new, "thing");
        assert_eq!(diff["entity"], "thing");
        assert!(diff["changes"].get("name").is_none());
        assert_eq!(diff["changes"]["qty"]["from"], 1);
        assert_eq!(diff["changes"]["qty"]["to"], 2);
    }

    #[test]
    fn identical_objects_have_empty_changes() {
        let a = Thing {
            name: "a".into(),
            qty: 1,
        };
        let diff = create_diff(&a, &a, "thing");
        assert_eq!(diff["changes"], json!({}));
    }
}
