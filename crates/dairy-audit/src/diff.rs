//! Field-level diffs between two entity snapshots.

use crate::record::FieldChange;
use serde_json::{Map, Value};

/// Compute the fields that differ between `old` and `new`.
///
/// Only top-level fields are compared; nested values are compared by deep
/// equality and reported whole. A field present on one side only is reported
/// with the other side left as `None`. Snapshots that are not JSON objects
/// contribute no fields.
///
/// Output order is deterministic: fields of `old` in their order, followed by
/// fields that exist only in `new`.
pub fn compute_changes(old: &Value, new: &Value, reason: &str) -> Vec<FieldChange> {
    let empty = Map::new();
    let old_fields = old.as_object().unwrap_or(&empty);
    let new_fields = new.as_object().unwrap_or(&empty);

    let mut changes = Vec::new();

    for (field, old_value) in old_fields {
        let new_value = new_fields.get(field);
        if new_value != Some(old_value) {
            changes.push(FieldChange {
                field: field.clone(),
                old_value: Some(old_value.clone()),
                new_value: new_value.cloned(),
                reason: reason.to_string(),
            });
        }
    }

    for (field, new_value) in new_fields {
        if !old_fields.contains_key(field) {
            changes.push(FieldChange {
                field: field.clone(),
                old_value: None,
                new_value: Some(new_value.clone()),
                reason: reason.to_string(),
            });
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_identical_snapshots_have_no_changes() {
        let snapshot = json!({"name": "A", "address": {"city": "Anand"}});
        assert!(compute_changes(&snapshot, &snapshot.clone(), "r").is_empty());
    }

    #[test]
    fn test_changed_field() {
        let changes = compute_changes(
            &json!({"name": "A", "code": "02001"}),
            &json!({"name": "B", "code": "02001"}),
            "rename",
        );
        assert_eq!(
            changes,
            vec![FieldChange {
                field: "name".to_string(),
                old_value: Some(json!("A")),
                new_value: Some(json!("B")),
                reason: "rename".to_string(),
            }]
        );
    }

    #[test]
    fn test_added_and_removed_fields() {
        let changes = compute_changes(&json!({"a": 1}), &json!({"b": 2}), "");
        assert_eq!(changes.len(), 2);

        assert_eq!(changes[0].field, "a");
        assert_eq!(changes[0].old_value, Some(json!(1)));
        assert_eq!(changes[0].new_value, None);

        assert_eq!(changes[1].field, "b");
        assert_eq!(changes[1].old_value, None);
        assert_eq!(changes[1].new_value, Some(json!(2)));

        let serialized = serde_json::to_value(&changes[1]).unwrap();
        assert!(serialized.get("oldValue").is_none());
    }

    #[test]
    fn test_nested_value_compared_deeply() {
        let changes = compute_changes(
            &json!({"address": {"city": "Anand", "pincode": "388001"}}),
            &json!({"address": {"pincode": "388001", "city": "Nadiad"}}),
            "",
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "address");
        assert_eq!(changes[0].new_value, Some(json!({"city": "Nadiad", "pincode": "388001"})));

        let same = compute_changes(
            &json!({"tags": [1, 2], "address": {"a": 1, "b": 2}}),
            &json!({"address": {"b": 2, "a": 1}, "tags": [1, 2]}),
            "",
        );
        assert!(same.is_empty());
    }

    #[test]
    fn test_explicit_null_differs_from_absent() {
        let changes = compute_changes(&json!({"phone": null}), &json!({}), "");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_value, Some(Value::Null));
        assert_eq!(changes[0].new_value, None);
    }

    #[test]
    fn test_non_object_snapshots() {
        assert!(compute_changes(&json!("text"), &json!(42), "").is_empty());

        let changes = compute_changes(&Value::Null, &json!({"name": "A"}), "");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_value, None);
    }

    #[test]
    fn test_order_old_fields_then_new_only() {
        let changes = compute_changes(
            &json!({"z": 1, "a": 1}),
            &json!({"m": 3, "z": 2, "a": 2}),
            "",
        );
        let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields.len(), 3);
        assert!(fields[..2].contains(&"a") && fields[..2].contains(&"z"));
        assert_eq!(fields[2], "m");
    }
}
