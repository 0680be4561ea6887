//! Configuration module for uow-audit
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Settings persistence
//! - The audit settings object handed to the assembler

pub mod paths;
pub mod settings;

pub use paths::AuditPaths;
pub use settings::{AuditMode, AuditSettings, IntrospectorKind, LogLevel, Settings};
