//! Audit log CLI command

use clap::Args;

use crate::audit::{detailed_changes, JsonLinesSink};
use crate::config::{AuditPaths, Settings};
use crate::error::{AuditError, AuditResult};

/// Arguments for `log`
#[derive(Args, Debug)]
pub struct LogArgs {
    /// Number of most recent events to show
    #[arg(short = 'n', long, default_value = "20")]
    pub recent: usize,

    /// Print events as a JSON array
    #[arg(long)]
    pub json: bool,

    /// Show every changed column, including nested paths
    #[arg(short, long)]
    pub verbose: bool,
}

/// Handle the log command
pub fn handle_log_command(
    paths: &AuditPaths,
    settings: &Settings,
    args: LogArgs,
) -> AuditResult<()> {
    let sink = JsonLinesSink::new(settings.audit_log_path(paths));
    let events = sink.read_recent(args.recent)?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&events).map_err(|e| AuditError::Json(e.to_string()))?;
        println!("{}", json);
        return Ok(());
    }

    let total = sink.event_count()?;
    if total == 0 {
        println!("No audit events recorded.");
        println!("Log file: {}", sink.path().display());
        return Ok(());
    }

    for event in &events {
        println!("{}", event.format_human_readable());

        if args.verbose {
            for record in &event.entries {
                let Some(changes) = record.changes.as_deref() else {
                    continue;
                };
                println!("    {} columns:", record.table);
                for line in detailed_changes(changes) {
                    println!("      {}", line);
                }
            }
        }
    }

    println!();
    println!("Showing {} of {} event(s)", events.len(), total);

    Ok(())
}
