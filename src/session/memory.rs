//! In-memory persistence session
//!
//! A minimal host for the interceptor: it tracks entries, owns a
//! connection, and "commits" by accepting pending changes.

use serde_json::{Map, Value};

use super::connection::MemoryConnection;
use super::entry::{EntityEntry, EntityState, TrackedEntry};
use super::{DbConnection, UnitOfWork};
use crate::error::{AuditError, AuditResult};

/// Session over tracked in-memory entries
#[derive(Debug, Clone)]
pub struct MemorySession {
    context: String,
    connection: MemoryConnection,
    entries: Vec<EntityEntry>,
    fail_next_commit: Option<String>,
}

impl MemorySession {
    /// Create a session for a named context
    pub fn new(context: impl Into<String>, connection: MemoryConnection) -> Self {
        Self {
            context: context.into(),
            connection,
            entries: Vec::new(),
            fail_next_commit: None,
        }
    }

    /// Start tracking an existing entity; returns its entry index
    pub fn attach(&mut self, entity_type: &str, values: Map<String, Value>) -> usize {
        self.track(EntityEntry::unchanged(entity_type, values))
    }

    /// Track a new entity for insertion; returns its entry index
    pub fn add(&mut self, entity_type: &str, values: Map<String, Value>) -> usize {
        self.track(EntityEntry::added(entity_type, values))
    }

    /// Track a prepared entry; returns its index
    pub fn track(&mut self, entry: EntityEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// Mutable access to a tracked entry
    pub fn entry_mut(&mut self, index: usize) -> AuditResult<&mut EntityEntry> {
        self.entries
            .get_mut(index)
            .ok_or_else(|| AuditError::Storage(format!("No tracked entry at index {}", index)))
    }

    /// Set a property on a tracked entry
    pub fn update(&mut self, index: usize, property: &str, value: Value) -> AuditResult<()> {
        self.entry_mut(index)?.set(property, value);
        Ok(())
    }

    /// Schedule a tracked entry for deletion
    pub fn remove(&mut self, index: usize) -> AuditResult<()> {
        self.entry_mut(index)?.mark_deleted();
        Ok(())
    }

    pub fn connection_mut(&mut self) -> &mut MemoryConnection {
        &mut self.connection
    }

    /// Make the next commit fail with the given message
    pub fn fail_next_commit(&mut self, message: impl Into<String>) {
        self.fail_next_commit = Some(message.into());
    }

    /// Number of entries with a pending write
    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state().is_pending())
            .count()
    }

    /// Number of entries still tracked
    pub fn tracked_count(&self) -> usize {
        self.entries.len()
    }
}

impl UnitOfWork for MemorySession {
    fn context_name(&self) -> &str {
        &self.context
    }

    fn entries(&self) -> Vec<&dyn TrackedEntry> {
        self.entries
            .iter()
            .map(|entry| entry as &dyn TrackedEntry)
            .collect()
    }

    fn connection(&self) -> &dyn DbConnection {
        &self.connection
    }

    fn commit(&mut self) -> AuditResult<usize> {
        if let Some(message) = self.fail_next_commit.take() {
            return Err(AuditError::Commit(message));
        }

        let rows = self.pending_count();
        for entry in &mut self.entries {
            entry.accept_changes();
        }
        self.entries.retain(|e| e.state() != EntityState::Detached);

        Ok(rows)
    }
}
