//! Primary key resolution

use serde_json::{Map, Value};

use super::schema::EntitySchema;
use crate::error::{AuditError, AuditResult};
use crate::session::Entity;

/// Key column to value, read from the live instance in key order
///
/// Keyless types yield an empty map. A declared key property the instance
/// does not have means the mapping is out of date and fails the capture.
pub fn resolve_primary_key(
    schema: &EntitySchema,
    entity: &dyn Entity,
) -> AuditResult<Map<String, Value>> {
    let mut key = Map::new();

    for property in schema.primary_key() {
        let value = entity
            .property(property)
            .ok_or_else(|| AuditError::key_property(schema.type_name(), property.as_str()))?;
        key.insert(schema.column_name_of(property).to_string(), value);
    }

    Ok(key)
}
