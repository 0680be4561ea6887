//! Entity validation
//!
//! Runs a schema's declarative rules, then its custom validators, against
//! the live instance. Failures are recorded on the audit record; they never
//! block the write.

use serde_json::Value;

use super::diff::format_value;
use super::schema::{EntitySchema, ValidationRule};
use crate::session::Entity;

/// Result of validating one entity
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub messages: Vec<String>,
}

impl ValidationOutcome {
    fn from_messages(messages: Vec<String>) -> Self {
        Self {
            valid: messages.is_empty(),
            messages,
        }
    }
}

/// Validate an entity against its schema
pub fn validate(schema: &EntitySchema, entity: &dyn Entity) -> ValidationOutcome {
    let mut messages: Vec<String> = schema
        .rules()
        .iter()
        .filter_map(|rule| check_rule(rule, entity))
        .collect();

    for validator in schema.validators() {
        messages.extend(validator.validate(entity));
    }

    ValidationOutcome::from_messages(messages)
}

/// Check one rule; `Some(message)` on failure
fn check_rule(rule: &ValidationRule, entity: &dyn Entity) -> Option<String> {
    let value = entity.property(rule.property()).unwrap_or(Value::Null);

    match rule {
        ValidationRule::Required { property } => {
            let missing = match &value {
                Value::Null => true,
                Value::String(s) => s.trim().is_empty(),
                _ => false,
            };
            missing.then(|| format!("The {} field is required.", property))
        }
        ValidationRule::MaxLength { property, max } => {
            let len = length_of(&value)?;
            (len > *max).then(|| {
                format!(
                    "The field {} must be a string or array type with a maximum length of '{}'.",
                    property, max
                )
            })
        }
        ValidationRule::MinLength { property, min } => {
            let len = length_of(&value)?;
            (len < *min).then(|| {
                format!(
                    "The field {} must be a string or array type with a minimum length of '{}'.",
                    property, min
                )
            })
        }
        ValidationRule::Range { property, min, max } => {
            if value.is_null() {
                return None;
            }
            let in_range = as_number(&value).is_some_and(|n| n >= *min && n <= *max);
            (!in_range).then(|| {
                format!(
                    "The field {} must be between {} and {}.",
                    property, min, max
                )
            })
        }
        ValidationRule::OneOf { property, values } => {
            if value.is_null() || values.contains(&value) {
                return None;
            }
            let allowed: Vec<String> = values.iter().map(format_value).collect();
            Some(format!(
                "The field {} must be one of: {}.",
                property,
                allowed.join(", ")
            ))
        }
    }
}

/// Length of a string (in characters) or array; other values are not measured
fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
