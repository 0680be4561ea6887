use anyhow::Result;
use clap::{Parser, Subcommand};

use uow_audit::cli::{
    handle_export_command, handle_log_command, handle_replay_command, ExportArgs, LogArgs,
    ReplayArgs,
};
use uow_audit::config::{AuditPaths, Settings};
use uow_audit::logging::init_logging;

#[derive(Parser)]
#[command(
    name = "uow-audit",
    author = "Kaylee Beyene",
    version,
    about = "Audit interceptor for unit-of-work persistence sessions",
    long_about = "uow-audit captures the inserts, updates and deletes of a \
                  unit of work at commit time and records them as a single \
                  audit event. Use it to replay captured change sets and \
                  inspect or export the audit log."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default settings file
    Init,

    /// Show current configuration and paths
    Config,

    /// Run a captured change set through the interceptor
    Replay(ReplayArgs),

    /// Show recent audit events
    Log(LogArgs),

    /// Export the audit log
    Export(ExportArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = AuditPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    init_logging(settings.log_level)?;

    match cli.command {
        Some(Commands::Init) => {
            println!("Initializing uow-audit at: {}", paths.base_dir().display());
            settings.save(&paths)?;
            println!("Settings written to: {}", paths.settings_file().display());
            println!("Audit log: {}", settings.audit_log_path(&paths).display());
        }
        Some(Commands::Config) => {
            let audit = &settings.audit;
            println!("uow-audit Configuration");
            println!("=======================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Settings file:  {}", paths.settings_file().display());
            println!(
                "Audit log:      {}",
                settings.audit_log_path(&paths).display()
            );
            println!("Initialized:    {}", paths.is_initialized());
            println!();
            println!("Settings:");
            println!("  Audit mode:        {}", audit.mode);
            println!("  Include entities:  {}", audit.include_entities);
            println!("  Audit disabled:    {}", audit.audit_disabled);
            println!("  Event type:        {}", audit.event_type_template);
            println!("  Introspector:      {}", audit.introspector);
            println!("  Log level:         {}", settings.log_level.as_str());
            if !audit.included_types.is_empty() {
                println!("  Included types:    {}", audit.included_types.join(", "));
            }
            if !audit.ignored_types.is_empty() {
                println!("  Ignored types:     {}", audit.ignored_types.join(", "));
            }
        }
        Some(Commands::Replay(args)) => handle_replay_command(&paths, &settings, args)?,
        Some(Commands::Log(args)) => handle_log_command(&paths, &settings, args)?,
        Some(Commands::Export(args)) => handle_export_command(&paths, &settings, args)?,
        None => {
            println!("uow-audit - unit-of-work audit interceptor");
            println!();
            println!("Run 'uow-audit --help' for usage information.");
            println!("Run 'uow-audit replay <file>' to audit a captured change set.");
        }
    }

    Ok(())
}
