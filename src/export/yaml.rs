//! YAML export of the audit log

use std::io::Write;

use super::json::AuditExport;
use crate::audit::AuditEvent;
use crate::error::{AuditError, AuditResult};

fn export_err(e: impl std::fmt::Display) -> AuditError {
    AuditError::Export(e.to_string())
}

/// Export events as YAML with a descriptive header
pub fn export_events_yaml<W: Write>(events: Vec<AuditEvent>, writer: &mut W) -> AuditResult<()> {
    let export = AuditExport::new(events);

    writeln!(writer, "# uow-audit log export").map_err(export_err)?;
    writeln!(writer, "# Generated: {}", export.exported_at).map_err(export_err)?;
    writeln!(writer, "# App Version: {}", export.app_version).map_err(export_err)?;
    writeln!(
        writer,
        "# Events: {}, records: {}",
        export.event_count, export.record_count
    )
    .map_err(export_err)?;
    writeln!(writer).map_err(export_err)?;

    serde_yaml::to_writer(writer, &export).map_err(export_err)
}

/// Read back a YAML export
pub fn import_events_yaml(yaml_str: &str) -> AuditResult<AuditExport> {
    let export: AuditExport = serde_yaml::from_str(yaml_str).map_err(export_err)?;
    export.validate().map_err(AuditError::Export)?;
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::sample_events;

    #[test]
    fn test_yaml_export() {
        let mut output = Vec::new();
        export_events_yaml(sample_events(), &mut output).unwrap();

        let yaml = String::from_utf8(output).unwrap();
        assert!(yaml.starts_with("# uow-audit log export"));
        assert!(yaml.contains("# Events: 2, records: 3"));
        assert!(yaml.contains("ShopContext:shop"));
        assert!(yaml.contains("table: Orders"));
    }

    #[test]
    fn test_yaml_readback() {
        let mut output = Vec::new();
        export_events_yaml(sample_events(), &mut output).unwrap();

        let imported = import_events_yaml(&String::from_utf8(output).unwrap()).unwrap();
        assert_eq!(imported.event_count, 2);
        assert_eq!(imported.events[1].entries.len(), 2);
        assert_eq!(
            imported.events[0].entries[0].validation_results,
            vec!["The Customer field is required.".to_string()]
        );
    }
}
