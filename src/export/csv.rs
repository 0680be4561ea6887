//! CSV export of the audit log
//!
//! Flattens events into one row per entity change record.

use std::io::Write;

use crate::audit::{format_key, summarize_changes, AuditEvent};
use crate::error::{AuditError, AuditResult};

const HEADER: [&str; 12] = [
    "Event Type",
    "Start Date",
    "Database",
    "Connection ID",
    "Transaction ID",
    "Table",
    "Action",
    "Primary Key",
    "Column Values",
    "Changes",
    "Valid",
    "Validation Results",
];

fn export_err(e: impl std::fmt::Display) -> AuditError {
    AuditError::Export(e.to_string())
}

/// Export every entity change record as a CSV row; returns the row count
pub fn export_records_csv<W: Write>(events: &[AuditEvent], writer: W) -> AuditResult<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADER).map_err(export_err)?;

    let mut rows = 0;
    for event in events {
        let start_date = event.start_date.to_rfc3339();
        for record in &event.entries {
            let column_values = serde_json::to_string(&record.column_values).map_err(export_err)?;
            let changes = record
                .changes
                .as_deref()
                .and_then(summarize_changes)
                .unwrap_or_default();
            let action = record.action.to_string();
            let primary_key = format_key(&record.primary_key);
            let validation_results = record.validation_results.join("; ");

            csv_writer
                .write_record([
                    event.event_type.as_str(),
                    start_date.as_str(),
                    event.database.as_deref().unwrap_or(""),
                    event.connection_id.as_deref().unwrap_or(""),
                    event.transaction_id.as_deref().unwrap_or(""),
                    record.table.as_str(),
                    action.as_str(),
                    primary_key.as_str(),
                    column_values.as_str(),
                    changes.as_str(),
                    if record.valid { "true" } else { "false" },
                    validation_results.as_str(),
                ])
                .map_err(export_err)?;
            rows += 1;
        }
    }

    csv_writer.flush().map_err(export_err)?;
    Ok(rows)
}
