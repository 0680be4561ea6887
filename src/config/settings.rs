//! Settings for uow-audit
//!
//! Holds the audit configuration handed to the assembler at construction
//! time, plus CLI-level preferences such as the log level.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::AuditPaths;
use crate::error::AuditError;
use crate::storage::file_io::{read_json_required, write_json_atomic};

/// Which entity types are audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditMode {
    /// Every tracked type, attributes are not consulted
    All,
    /// Every type except the ones marked as ignored
    #[default]
    OptOut,
    /// Only the types marked as included
    OptIn,
}

impl AuditMode {
    /// Parse a mode from its CLI spelling
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "all" => Some(Self::All),
            "opt_out" | "optout" => Some(Self::OptOut),
            "opt_in" | "optin" => Some(Self::OptIn),
            _ => None,
        }
    }
}

impl fmt::Display for AuditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::OptOut => write!(f, "opt-out"),
            Self::OptIn => write!(f, "opt-in"),
        }
    }
}

/// How correlation ids are pulled out of the provider's connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntrospectorKind {
    /// The provider exposes connection and transaction ids directly
    #[default]
    Direct,
    /// Transaction id built from the connection id and a native handle
    NativeHandle,
    /// Transaction id hashed from the provider's session token
    SessionToken,
}

impl fmt::Display for IntrospectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::NativeHandle => write!(f, "native_handle"),
            Self::SessionToken => write!(f, "session_token"),
        }
    }
}

/// Log verbosity for the CLI subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive string understood by `EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Configuration consumed by the event assembler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSettings {
    /// Inclusion policy applied per entity type
    #[serde(default)]
    pub mode: AuditMode,

    /// Attach a full entity snapshot to every record
    #[serde(default)]
    pub include_entities: bool,

    /// Skip capture entirely
    #[serde(default)]
    pub audit_disabled: bool,

    /// Template for `AuditEvent::event_type`; `{context}` and `{database}`
    /// are substituted
    #[serde(default = "default_event_type_template")]
    pub event_type_template: String,

    /// Correlation strategy for the configured provider
    #[serde(default)]
    pub introspector: IntrospectorKind,

    /// Type identifiers audited in opt-in mode, in addition to schema attributes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_types: Vec<String>,

    /// Type identifiers skipped in opt-out mode, in addition to schema attributes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_types: Vec<String>,
}

fn default_event_type_template() -> String {
    "{context}:{database}".to_string()
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            mode: AuditMode::default(),
            include_entities: false,
            audit_disabled: false,
            event_type_template: default_event_type_template(),
            introspector: IntrospectorKind::default(),
            included_types: Vec::new(),
            ignored_types: Vec::new(),
        }
    }
}

impl AuditSettings {
    /// Render the event type for a context and database name
    pub fn render_event_type(&self, context: &str, database: Option<&str>) -> String {
        self.event_type_template
            .replace("{context}", context)
            .replace("{database}", database.unwrap_or(""))
    }
}

/// Persisted settings for uow-audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Capture configuration
    #[serde(default)]
    pub audit: AuditSettings,

    /// Default log level when `RUST_LOG` is not set
    #[serde(default)]
    pub log_level: LogLevel,

    /// Audit log location; defaults to `audit.log` under the base directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_log: Option<PathBuf>,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            audit: AuditSettings::default(),
            log_level: LogLevel::default(),
            audit_log: None,
        }
    }
}

impl Settings {
    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &AuditPaths) -> Result<Self, AuditError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            read_json_required(&settings_path).map_err(|e| {
                AuditError::Config(format!("Failed to load settings file: {}", e))
            })
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &AuditPaths) -> Result<(), AuditError> {
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }

    /// Resolve the audit log path against the configured paths
    pub fn audit_log_path(&self, paths: &AuditPaths) -> PathBuf {
        self.audit_log.clone().unwrap_or_else(|| paths.audit_log())
    }
}
