//! Export CLI command
//!
//! Writes the audit log to a file or stdout in JSON, YAML or CSV.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::audit::{AuditEvent, JsonLinesSink};
use crate::config::{AuditPaths, Settings};
use crate::error::{AuditError, AuditResult};
use crate::export::{export_events_json, export_events_yaml, export_records_csv};

/// Export format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    /// JSON document with every event
    Json,
    /// YAML document, human-readable
    Yaml,
    /// CSV, one row per entity change record
    Csv,
}

/// Arguments for `export`
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: ExportFormat,

    /// Output file path; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Single-line JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,
}

fn write_export<W: Write>(
    format: ExportFormat,
    events: Vec<AuditEvent>,
    compact: bool,
    writer: &mut W,
) -> AuditResult<()> {
    match format {
        ExportFormat::Json => export_events_json(events, writer, !compact)?,
        ExportFormat::Yaml => export_events_yaml(events, writer)?,
        ExportFormat::Csv => {
            export_records_csv(&events, &mut *writer)?;
        }
    }
    writer
        .flush()
        .map_err(|e| AuditError::Export(format!("Failed to flush export: {}", e)))
}

/// Handle the export command
pub fn handle_export_command(
    paths: &AuditPaths,
    settings: &Settings,
    args: ExportArgs,
) -> AuditResult<()> {
    let events = JsonLinesSink::new(settings.audit_log_path(paths)).read_all()?;
    let count = events.len();

    match &args.output {
        Some(output) => {
            let file = File::create(output).map_err(|e| {
                AuditError::Export(format!("Failed to create file {}: {}", output.display(), e))
            })?;
            let mut writer = BufWriter::new(file);
            write_export(args.format, events, args.compact, &mut writer)?;
            println!("Exported {} event(s) to: {}", count, output.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            write_export(args.format, events, args.compact, &mut writer)?;
            if !matches!(args.format, ExportFormat::Csv) {
                writeln!(writer)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditSink, Correlation};
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_export_to_file() {
        let temp = TempDir::new().unwrap();
        let paths = AuditPaths::with_base_dir(temp.path().to_path_buf());
        let settings = Settings::default();

        let sink = JsonLinesSink::new(paths.audit_log());
        sink.write(&AuditEvent::new("Ctx:db", Correlation::default(), Vec::new(), Utc::now()))
            .unwrap();

        let output = temp.path().join("export.yaml");
        handle_export_command(
            &paths,
            &settings,
            ExportArgs {
                format: ExportFormat::Yaml,
                output: Some(output.clone()),
                compact: false,
            },
        )
        .unwrap();

        let text = std::fs::read_to_string(output).unwrap();
        assert!(text.contains("Ctx:db"));
        assert!(text.contains("event_count: 1"));
    }
}
