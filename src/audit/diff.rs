//! Change summaries for audit records
//!
//! Renders column changes and key maps as short human-readable text for
//! the CLI and `AuditEvent::format_human_readable`.

use serde_json::{Map, Value};

use super::event::ColumnChange;

const MAX_STRING_DISPLAY: usize = 50;

/// Summarize the column changes of an update on one line
///
/// Returns `None` when there is nothing to report.
pub fn summarize_changes(changes: &[ColumnChange]) -> Option<String> {
    if changes.is_empty() {
        return None;
    }

    let parts: Vec<String> = changes
        .iter()
        .map(|c| {
            format!(
                "{}: {} -> {}",
                c.column_name,
                format_value(&c.original_value),
                format_value(&c.new_value)
            )
        })
        .collect();

    Some(parts.join(", "))
}

/// Render a key map as `Col=value, Col=value`
pub fn format_key(key: &Map<String, Value>) -> String {
    key.iter()
        .map(|(column, value)| format!("{}={}", column, format_value(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format a JSON value for human-readable display
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            if s.chars().count() > MAX_STRING_DISPLAY {
                let head: String = s.chars().take(MAX_STRING_DISPLAY - 3).collect();
                format!("\"{}...\"", head)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

/// List changes one per line, descending into structured column values
///
/// A column holding a JSON document reports the nested paths that differ
/// (`Address.City: "Oslo" -> "Bergen"`) instead of `{3 fields} -> {3 fields}`.
/// Flagged-but-equal columns are listed as `(unchanged)`.
pub fn detailed_changes(changes: &[ColumnChange]) -> Vec<String> {
    let mut lines = Vec::new();

    for change in changes {
        if change.original_value == change.new_value {
            lines.push(format!("{}: (unchanged)", change.column_name));
            continue;
        }
        nested_diff(
            &change.original_value,
            &change.new_value,
            &change.column_name,
            &mut lines,
        );
    }

    lines
}

fn nested_diff(before: &Value, after: &Value, prefix: &str, lines: &mut Vec<String>) {
    match (before, after) {
        (Value::Object(before_obj), Value::Object(after_obj)) => {
            for (key, before_val) in before_obj {
                let path = format!("{}.{}", prefix, key);
                match after_obj.get(key) {
                    Some(after_val) if after_val != before_val => {
                        nested_diff(before_val, after_val, &path, lines)
                    }
                    Some(_) => {}
                    None => {
                        lines.push(format!("{}: {} -> (removed)", path, format_value(before_val)))
                    }
                }
            }

            for (key, after_val) in after_obj {
                if !before_obj.contains_key(key) {
                    lines.push(format!(
                        "{}.{}: (added) -> {}",
                        prefix,
                        key,
                        format_value(after_val)
                    ));
                }
            }
        }
        (Value::Array(before_arr), Value::Array(after_arr))
            if before_arr.len() == after_arr.len() =>
        {
            for (i, (b, a)) in before_arr.iter().zip(after_arr.iter()).enumerate() {
                if b != a {
                    nested_diff(b, a, &format!("{}[{}]", prefix, i), lines);
                }
            }
        }
        _ => lines.push(format!(
            "{}: {} -> {}",
            prefix,
            format_value(before),
            format_value(after)
        )),
    }
}
