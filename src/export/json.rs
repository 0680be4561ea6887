//! JSON export of the audit log

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::AuditEvent;
use crate::error::{AuditError, AuditResult};

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Exported audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    pub event_count: usize,

    /// Total entity change records across all events
    pub record_count: usize,

    pub events: Vec<AuditEvent>,
}

impl AuditExport {
    pub fn new(events: Vec<AuditEvent>) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            event_count: events.len(),
            record_count: events.iter().map(|e| e.entries.len()).sum(),
            events,
        }
    }

    /// Check the export's version and counts
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        if self.event_count != self.events.len() {
            return Err(format!(
                "Event count mismatch: header says {}, found {}",
                self.event_count,
                self.events.len()
            ));
        }

        Ok(())
    }
}

/// Export events as a JSON document
pub fn export_events_json<W: Write>(
    events: Vec<AuditEvent>,
    writer: &mut W,
    pretty: bool,
) -> AuditResult<()> {
    let export = AuditExport::new(events);

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| AuditError::Export(e.to_string()))
}

/// Read back a JSON export
pub fn import_events_json(json_str: &str) -> AuditResult<AuditExport> {
    let export: AuditExport =
        serde_json::from_str(json_str).map_err(|e| AuditError::Export(e.to_string()))?;
    export.validate().map_err(AuditError::Export)?;
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::sample_events;

    #[test]
    fn test_export_counts() {
        let export = AuditExport::new(sample_events());
        assert_eq!(export.event_count, 2);
        assert_eq!(export.record_count, 3);
        assert!(export.validate().is_ok());
    }

    #[test]
    fn test_json_readback() {
        let events = sample_events();
        let mut output = Vec::new();
        export_events_json(events.clone(), &mut output, true).unwrap();

        let imported = import_events_json(&String::from_utf8(output).unwrap()).unwrap();
        assert_eq!(imported.events, events);
        assert_eq!(imported.events[0].entries[0].table, "Orders");
    }

    #[test]
    fn test_rejects_version_mismatch() {
        let mut export = AuditExport::new(Vec::new());
        export.schema_version = "0.1.0".into();
        let json = serde_json::to_string(&export).unwrap();
        assert!(import_events_json(&json).is_err());
    }
}
