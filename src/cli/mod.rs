//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the audit pipeline.

pub mod export;
pub mod log;
pub mod replay;

pub use export::{handle_export_command, ExportArgs, ExportFormat};
pub use log::{handle_log_command, LogArgs};
pub use replay::{handle_replay_command, ReplayArgs};
