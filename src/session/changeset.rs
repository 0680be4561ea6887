//! Captured change sets
//!
//! A change set is a JSON document describing one unit of work: the entity
//! schemas, the connection state, and the tracked entries. The CLI replays
//! it through the interceptor.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::connection::MemoryConnection;
use super::entry::EntityEntry;
use super::memory::MemorySession;
use crate::audit::{EntitySchema, SchemaRegistry};
use crate::error::AuditResult;
use crate::storage::file_io::read_json_required;

/// One serialized unit of work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Session type name
    #[serde(default = "default_context")]
    pub context: String,

    pub connection: MemoryConnection,

    #[serde(default)]
    pub schemas: Vec<EntitySchema>,

    #[serde(default)]
    pub entries: Vec<EntityEntry>,
}

fn default_context() -> String {
    "DbContext".to_string()
}

impl ChangeSet {
    /// Load a change set from a JSON file
    pub fn load(path: impl AsRef<Path>) -> AuditResult<Self> {
        read_json_required(path)
    }

    /// Split into a schema registry and a session ready to commit
    pub fn into_session(self) -> AuditResult<(SchemaRegistry, MemorySession)> {
        let registry = SchemaRegistry::from_schemas(self.schemas)?;

        let mut session = MemorySession::new(self.context, self.connection);
        for entry in self.entries {
            session.track(entry);
        }

        Ok((registry, session))
    }
}
