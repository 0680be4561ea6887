//! Custom error types for uow-audit
//!
//! This module defines the error hierarchy for the interceptor using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for audit capture and its surrounding tooling
#[derive(Error, Debug)]
pub enum AuditError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// A tracked entity whose type has no registered schema
    #[error("No schema registered for entity type '{0}'")]
    UnknownEntityType(String),

    /// A declared primary key property could not be read from the live entity
    #[error("Cannot read key property '{property}' of entity type '{entity_type}'")]
    KeyProperty {
        entity_type: String,
        property: String,
    },

    /// A mapped property the change tracker does not supply
    #[error("Tracked entry for '{entity_type}' has no property '{property}'")]
    MissingProperty {
        entity_type: String,
        property: String,
    },

    /// Schema definition errors (duplicate columns, dangling key properties)
    #[error("Schema error: {0}")]
    Schema(String),

    /// The host failed to commit the unit of work
    #[error("Commit failed: {0}")]
    Commit(String),

    /// The audit sink rejected an event
    #[error("Sink error: {0}")]
    Sink(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AuditError {
    /// Create a key-property error for an entity type
    pub fn key_property(entity_type: impl Into<String>, property: impl Into<String>) -> Self {
        Self::KeyProperty {
            entity_type: entity_type.into(),
            property: property.into(),
        }
    }

    /// Create a missing-property error for an entity type
    pub fn missing_property(entity_type: impl Into<String>, property: impl Into<String>) -> Self {
        Self::MissingProperty {
            entity_type: entity_type.into(),
            property: property.into(),
        }
    }

    /// Check if this error points at a mapping inconsistency the caller must fix
    pub fn is_mapping(&self) -> bool {
        matches!(
            self,
            Self::UnknownEntityType(_) | Self::KeyProperty { .. } | Self::MissingProperty { .. }
        )
    }

    /// Check if this is a commit error
    pub fn is_commit(&self) -> bool {
        matches!(self, Self::Commit(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for AuditError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for uow-audit operations
pub type AuditResult<T> = Result<T, AuditError>;
