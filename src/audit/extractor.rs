//! Column value extraction
//!
//! Reads mapped column values and modified columns from a tracked entry.

use serde_json::{Map, Value};

use super::event::{ColumnChange, MutationKind};
use super::schema::EntitySchema;
use crate::error::{AuditError, AuditResult};
use crate::session::{PropertyEntry, TrackedEntry};

fn tracked_property(
    entry: &dyn TrackedEntry,
    schema: &EntitySchema,
    property: &str,
) -> AuditResult<PropertyEntry> {
    entry
        .property(property)
        .ok_or_else(|| AuditError::missing_property(schema.type_name(), property))
}

/// Every mapped column with its value, in mapping order
///
/// Deletes report original values; inserts and updates report current values.
pub fn column_values(
    entry: &dyn TrackedEntry,
    schema: &EntitySchema,
    kind: MutationKind,
) -> AuditResult<Map<String, Value>> {
    let mut values = Map::new();

    for mapping in schema.columns() {
        let prop = tracked_property(entry, schema, &mapping.property)?;
        let value = match kind {
            MutationKind::Delete => prop.original,
            MutationKind::Insert | MutationKind::Update => prop.current,
        };
        values.insert(mapping.column_name().to_string(), value);
    }

    Ok(values)
}

/// Columns the tracker flags as modified
///
/// The tracker's dirty flag is authoritative: a flagged column is reported
/// even when its original and current values are equal.
pub fn column_changes(
    entry: &dyn TrackedEntry,
    schema: &EntitySchema,
) -> AuditResult<Vec<ColumnChange>> {
    let mut changes = Vec::new();

    for mapping in schema.columns() {
        let prop = tracked_property(entry, schema, &mapping.property)?;
        if prop.is_modified {
            changes.push(ColumnChange {
                column_name: mapping.column_name().to_string(),
                original_value: prop.original,
                new_value: prop.current,
            });
        }
    }

    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::EntityEntry;
    use serde_json::json;

    fn schema() -> EntitySchema {
        EntitySchema::builder("Sales.Order")
            .column("Id")
            .column_as("Status", "status")
            .column("Total")
            .key(["Id"])
            .build()
            .unwrap()
    }

    fn loaded() -> EntityEntry {
        EntityEntry::unchanged(
            "Sales.Order",
            json!({"Id": 1, "Status": "open", "Total": 10})
                .as_object()
                .cloned()
                .unwrap(),
        )
    }

    #[test]
    fn test_update_single_change_and_current_values() {
        let mut entry = loaded();
        entry.set("Status", json!("shipped"));

        let changes = column_changes(&entry, &schema()).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].column_name, "status");
        assert_eq!(changes[0].original_value, json!("open"));
        assert_eq!(changes[0].new_value, json!("shipped"));

        let values = column_values(&entry, &schema(), MutationKind::Update).unwrap();
        assert_eq!(
            serde_json::to_value(&values).unwrap(),
            json!({"Id": 1, "status": "shipped", "Total": 10})
        );
    }

    #[test]
    fn test_delete_uses_original_values() {
        let mut entry = loaded();
        entry.set("Total", json!(99));
        entry.mark_deleted();

        let values = column_values(&entry, &schema(), MutationKind::Delete).unwrap();
        assert_eq!(values["Total"], json!(10));
        assert_eq!(values["status"], json!("open"));
    }

    #[test]
    fn test_flagged_equal_value_is_reported() {
        let mut entry = loaded();
        entry.set("Total", json!(10));

        let changes = column_changes(&entry, &schema()).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].original_value, changes[0].new_value);
    }

    #[test]
    fn test_missing_mapped_property() {
        let entry = EntityEntry::added(
            "Sales.Order",
            json!({"Id": 1, "Status": "open"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let err = column_values(&entry, &schema(), MutationKind::Insert).unwrap_err();
        assert!(matches!(err, AuditError::MissingProperty { .. }));
    }
}
