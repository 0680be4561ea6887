//! Replay CLI command
//!
//! Loads a captured change set, runs it through the interceptor against the
//! in-memory session, and records the resulting event.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::audit::{
    AuditEvent, AuditInterceptor, AuditSink, CommitHook, EventAssembler, JsonLinesSink, MemorySink,
};
use crate::config::{AuditMode, AuditPaths, Settings};
use crate::error::{AuditError, AuditResult};
use crate::session::ChangeSet;

fn parse_mode(s: &str) -> Result<AuditMode, String> {
    AuditMode::parse(s).ok_or_else(|| format!("unknown audit mode '{}' (all, opt-in, opt-out)", s))
}

/// Arguments for `replay`
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Change set JSON file
    pub file: PathBuf,

    /// Write the event before (pre) or after (post) the commit
    #[arg(long, default_value = "post")]
    pub hook: CommitHook,

    /// Override the configured audit mode
    #[arg(short, long, value_parser = parse_mode)]
    pub mode: Option<AuditMode>,

    /// Attach full entity snapshots to each record
    #[arg(long)]
    pub include_entities: bool,

    /// Print the event as JSON
    #[arg(long)]
    pub json: bool,

    /// Capture and commit without writing to the audit log
    #[arg(long)]
    pub dry_run: bool,
}

/// Forwards to an inner sink and keeps a copy of what was accepted
struct RecordingSink<S> {
    inner: S,
    seen: MemorySink,
}

impl<S: AuditSink> AuditSink for RecordingSink<S> {
    fn write(&self, event: &AuditEvent) -> AuditResult<()> {
        self.inner.write(event)?;
        self.seen.write(event)
    }
}

/// Handle the replay command
pub fn handle_replay_command(
    paths: &AuditPaths,
    settings: &Settings,
    args: ReplayArgs,
) -> AuditResult<()> {
    let change_set = ChangeSet::load(&args.file)?;
    let (registry, mut session) = change_set.into_session()?;

    let mut audit = settings.audit.clone();
    if let Some(mode) = args.mode {
        audit.mode = mode;
    }
    if args.include_entities {
        audit.include_entities = true;
    }

    let assembler = EventAssembler::new(Arc::new(registry), audit);
    let log_path = settings.audit_log_path(paths);

    let inner: Box<dyn AuditSink> = if args.dry_run {
        Box::new(MemorySink::new())
    } else {
        Box::new(JsonLinesSink::new(&log_path))
    };
    let interceptor = AuditInterceptor::new(
        assembler,
        RecordingSink {
            inner,
            seen: MemorySink::new(),
        },
        args.hook,
    );

    let rows = interceptor.save_changes(&mut session)?;
    let events = interceptor.sink().seen.events();

    match events.first() {
        None if args.json => println!("null"),
        None => println!("Nothing to audit."),
        Some(event) if args.json => {
            let json =
                serde_json::to_string_pretty(event).map_err(|e| AuditError::Json(e.to_string()))?;
            println!("{}", json);
        }
        Some(event) => {
            println!("{}", event.format_human_readable());
            println!();
        }
    }

    if !args.json {
        println!("Rows affected: {}", rows);
        if !events.is_empty() {
            if args.dry_run {
                println!("Dry run: audit log not written.");
            } else {
                println!("Logged to: {}", log_path.display());
            }
        }
    }

    Ok(())
}
