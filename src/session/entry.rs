//! Tracked entity entries
//!
//! A tracked entry is an entity instance plus its mutation state and the
//! per-property original/current values kept by the change tracker.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AuditError, AuditResult};

/// Mutation state of a tracked entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntityState {
    /// Not tracked (or removed after a committed delete)
    Detached,
    /// Loaded and untouched since the last commit
    #[default]
    Unchanged,
    /// New instance, will be inserted
    Added,
    /// At least one property marked modified
    Modified,
    /// Will be deleted
    Deleted,
}

impl EntityState {
    /// True for the states that produce a write on commit
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Added | Self::Modified | Self::Deleted)
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detached => write!(f, "Detached"),
            Self::Unchanged => write!(f, "Unchanged"),
            Self::Added => write!(f, "Added"),
            Self::Modified => write!(f, "Modified"),
            Self::Deleted => write!(f, "Deleted"),
        }
    }
}

/// Original/current values of one property as seen by the tracker
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyEntry {
    pub original: Value,
    pub current: Value,
    /// Dirty flag as reported by the tracker, not a value comparison
    pub is_modified: bool,
}

/// Read access to a live entity instance
pub trait Entity {
    /// Current value of a property, or `None` if the instance has no such property
    fn property(&self, name: &str) -> Option<Value>;

    /// Full serialized form of the instance
    fn snapshot(&self) -> Value;
}

impl Entity for Map<String, Value> {
    fn property(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn snapshot(&self) -> Value {
        Value::Object(self.clone())
    }
}

/// What the interceptor needs from one entry of the change tracker
pub trait TrackedEntry {
    /// Type identifier used to look up the entity schema
    fn entity_type(&self) -> &str;

    fn state(&self) -> EntityState;

    /// Tracker view of a single property
    fn property(&self, name: &str) -> Option<PropertyEntry>;

    /// The live instance
    fn entity(&self) -> &dyn Entity;
}

/// Change-tracker entry used by the in-memory session
///
/// Property writes always mark the property modified, even when the new
/// value equals the old one, like a snapshot-less tracker would.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityEntry {
    entity_type: String,

    #[serde(default)]
    state: EntityState,

    /// The live instance
    current: Map<String, Value>,

    /// Values as of the last load/commit
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    original: Map<String, Value>,

    /// Properties flagged dirty
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    modified: BTreeSet<String>,
}

impl EntityEntry {
    /// Track an existing, unchanged entity
    pub fn unchanged(entity_type: impl Into<String>, values: Map<String, Value>) -> Self {
        Self {
            entity_type: entity_type.into(),
            state: EntityState::Unchanged,
            original: values.clone(),
            current: values,
            modified: BTreeSet::new(),
        }
    }

    /// Track a new entity that will be inserted
    pub fn added(entity_type: impl Into<String>, values: Map<String, Value>) -> Self {
        Self {
            entity_type: entity_type.into(),
            state: EntityState::Added,
            original: Map::new(),
            current: values,
            modified: BTreeSet::new(),
        }
    }

    /// Track a serializable entity value
    ///
    /// The value must serialize to a JSON object.
    pub fn from_entity<T: Serialize>(
        entity_type: impl Into<String>,
        entity: &T,
        state: EntityState,
    ) -> AuditResult<Self> {
        let entity_type = entity_type.into();
        let values = match serde_json::to_value(entity)? {
            Value::Object(map) => map,
            other => {
                return Err(AuditError::Json(format!(
                    "Entity of type '{}' serialized to {} instead of an object",
                    entity_type,
                    json_kind(&other)
                )))
            }
        };

        let mut entry = Self::unchanged(entity_type, values);
        match state {
            EntityState::Added => entry.original.clear(),
            EntityState::Deleted => entry.mark_deleted(),
            _ => {}
        }
        entry.state = state;
        Ok(entry)
    }

    /// Write a property on the live instance and flag it modified
    pub fn set(&mut self, property: impl Into<String>, value: Value) {
        let property = property.into();
        self.current.insert(property.clone(), value);

        if self.state == EntityState::Added {
            return;
        }

        self.modified.insert(property);
        if self.state == EntityState::Unchanged {
            self.state = EntityState::Modified;
        }
    }

    /// Schedule the entity for deletion
    ///
    /// Deleting an entity that was never inserted simply detaches it.
    pub fn mark_deleted(&mut self) {
        self.state = match self.state {
            EntityState::Added => EntityState::Detached,
            _ => EntityState::Deleted,
        };
    }

    /// Reset tracking after a successful commit
    pub fn accept_changes(&mut self) {
        match self.state {
            EntityState::Added | EntityState::Modified => {
                self.original = self.current.clone();
                self.modified.clear();
                self.state = EntityState::Unchanged;
            }
            EntityState::Deleted => self.state = EntityState::Detached,
            EntityState::Unchanged | EntityState::Detached => {}
        }
    }

    /// Names of the properties flagged modified
    pub fn modified_properties(&self) -> impl Iterator<Item = &str> {
        self.modified.iter().map(String::as_str)
    }
}

impl TrackedEntry for EntityEntry {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn state(&self) -> EntityState {
        self.state
    }

    fn property(&self, name: &str) -> Option<PropertyEntry> {
        let current = self.current.get(name).or_else(|| self.original.get(name))?;
        // Added entities have no separate original snapshot
        let original = self.original.get(name).unwrap_or(current);

        Some(PropertyEntry {
            original: original.clone(),
            current: current.clone(),
            is_modified: self.modified.contains(name),
        })
    }

    fn entity(&self) -> &dyn Entity {
        &self.current
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
