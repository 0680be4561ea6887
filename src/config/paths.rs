//! Path management for uow-audit
//!
//! Provides XDG-compliant path resolution for the settings file and the
//! default audit log.
//!
//! ## Path Resolution Order
//!
//! 1. `UOW_AUDIT_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/uow-audit` or `~/.config/uow-audit`
//! 3. Windows: `%APPDATA%\uow-audit`

use std::path::PathBuf;

use crate::error::AuditError;

/// Environment variable overriding the base directory
pub const BASE_DIR_ENV: &str = "UOW_AUDIT_DIR";

/// Manages all paths used by uow-audit
#[derive(Debug, Clone)]
pub struct AuditPaths {
    /// Base directory for settings and logs
    base_dir: PathBuf,
}

impl AuditPaths {
    /// Create a new AuditPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if neither the override nor a home directory can be
    /// determined.
    pub fn new() -> Result<Self, AuditError> {
        let base_dir = if let Ok(custom) = std::env::var(BASE_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create AuditPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the default audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> Result<(), AuditError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| AuditError::Io(format!("Failed to create base directory: {}", e)))?;

        Ok(())
    }

    /// Check if a settings file has been written
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, AuditError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) => PathBuf::from(xdg),
        Err(_) => {
            let home = std::env::var("HOME").map_err(|_| {
                AuditError::Config("Could not determine HOME directory".into())
            })?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("uow-audit"))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, AuditError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| AuditError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("uow-audit"))
}
