//! Audit event data structures
//!
//! Defines the event produced for one committed unit of work and the
//! per-entity change records it carries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::correlation::Correlation;
use super::diff::{format_key, summarize_changes};
use crate::error::AuditError;
use crate::session::EntityState;

/// Kind of write performed on an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    Insert,
    Update,
    Delete,
}

impl MutationKind {
    /// Classify a tracker state; `None` for states that write nothing
    pub fn from_state(state: EntityState) -> Option<Self> {
        match state {
            EntityState::Added => Some(Self::Insert),
            EntityState::Modified => Some(Self::Update),
            EntityState::Deleted => Some(Self::Delete),
            EntityState::Unchanged | EntityState::Detached => None,
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationKind::Insert => write!(f, "Insert"),
            MutationKind::Update => write!(f, "Update"),
            MutationKind::Delete => write!(f, "Delete"),
        }
    }
}

/// Old and new value of one modified column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnChange {
    pub column_name: String,
    pub original_value: Value,
    pub new_value: Value,
}

/// Audit record for a single entity written by the unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityChangeRecord {
    /// Table the entity is mapped to
    pub table: String,

    pub action: MutationKind,

    /// Key column to value, in key order
    pub primary_key: Map<String, Value>,

    /// Every mapped column; original values for deletes, current otherwise
    pub column_values: Map<String, Value>,

    /// Modified columns, present only for updates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<ColumnChange>>,

    pub valid: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_results: Vec<String>,

    /// Full entity snapshot, when configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<Value>,
}

impl EntityChangeRecord {
    /// One-line description used by the human-readable event format
    pub fn describe(&self) -> String {
        let mut output = format!("{} {}", self.action, self.table);

        if !self.primary_key.is_empty() {
            output.push_str(&format!(" [{}]", format_key(&self.primary_key)));
        }

        if let Some(summary) = self.changes.as_deref().and_then(summarize_changes) {
            output.push_str(&format!("\n    Changes: {}", summary));
        }

        if !self.valid {
            output.push_str(&format!("\n    Invalid: {}", self.validation_results.join("; ")));
        }

        output
    }
}

/// Result of the commit, recorded when auditing after the write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitOutcome {
    pub success: bool,
    pub rows_affected: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl CommitOutcome {
    pub fn from_result(result: &Result<usize, AuditError>) -> Self {
        match result {
            Ok(rows) => Self {
                success: true,
                rows_affected: *rows,
                error_message: None,
            },
            Err(e) => Self {
                success: false,
                rows_affected: 0,
                error_message: Some(e.to_string()),
            },
        }
    }
}

/// Audit event for one committed unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    pub entries: Vec<EntityChangeRecord>,

    /// When change capture started (UTC)
    pub start_date: DateTime<Utc>,

    /// When the event was finalized (UTC)
    pub end_date: DateTime<Utc>,

    pub duration_ms: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<CommitOutcome>,
}

impl AuditEvent {
    /// Assemble an event from captured records
    pub fn new(
        event_type: impl Into<String>,
        correlation: Correlation,
        entries: Vec<EntityChangeRecord>,
        start_date: DateTime<Utc>,
    ) -> Self {
        let mut event = Self {
            event_type: event_type.into(),
            database: correlation.database,
            connection_id: correlation.connection_id,
            transaction_id: correlation.transaction_id,
            entries,
            start_date,
            end_date: start_date,
            duration_ms: 0,
            outcome: None,
        };
        event.stamp_end();
        event
    }

    /// Attach the commit result and restamp the end time
    pub fn complete(&mut self, outcome: CommitOutcome) {
        self.outcome = Some(outcome);
        self.stamp_end();
    }

    fn stamp_end(&mut self) {
        self.end_date = Utc::now();
        self.duration_ms = (self.end_date - self.start_date).num_milliseconds();
    }

    /// Format the event for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {}",
            self.start_date.format("%Y-%m-%d %H:%M:%S UTC"),
            self.event_type
        );

        if let Some(tx) = &self.transaction_id {
            output.push_str(&format!(" tx={}", tx));
        }

        if let Some(outcome) = &self.outcome {
            match &outcome.error_message {
                None => output.push_str(&format!(" ({} rows)", outcome.rows_affected)),
                Some(message) => output.push_str(&format!(" (FAILED: {})", message)),
            }
        }

        for entry in &self.entries {
            output.push_str("\n  ");
            output.push_str(&entry.describe());
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update_record() -> EntityChangeRecord {
        let mut primary_key = Map::new();
        primary_key.insert("Id".into(), json!(7));
        let mut column_values = Map::new();
        column_values.insert("Id".into(), json!(7));
        column_values.insert("Status".into(), json!("shipped"));

        EntityChangeRecord {
            table: "Orders".into(),
            action: MutationKind::Update,
            primary_key,
            column_values,
            changes: Some(vec![ColumnChange {
                column_name: "Status".into(),
                original_value: json!("open"),
                new_value: json!("shipped"),
            }]),
            valid: true,
            validation_results: Vec::new(),
            entity: None,
        }
    }

    fn correlation() -> Correlation {
        Correlation {
            database: Some("shop".into()),
            connection_id: Some("c-1".into()),
            transaction_id: None,
        }
    }

    #[test]
    fn test_mutation_kind_from_state() {
        assert_eq!(
            MutationKind::from_state(EntityState::Added),
            Some(MutationKind::Insert)
        );
        assert_eq!(
            MutationKind::from_state(EntityState::Modified),
            Some(MutationKind::Update)
        );
        assert_eq!(
            MutationKind::from_state(EntityState::Deleted),
            Some(MutationKind::Delete)
        );
        assert_eq!(MutationKind::from_state(EntityState::Unchanged), None);
        assert_eq!(MutationKind::from_state(EntityState::Detached), None);
    }

    #[test]
    fn test_event_copies_correlation() {
        let records = vec![update_record()];
        let event = AuditEvent::new("Shop:shop", correlation(), records, Utc::now());
        assert_eq!(event.database.as_deref(), Some("shop"));
        assert_eq!(event.connection_id.as_deref(), Some("c-1"));
        assert!(event.transaction_id.is_none());
        assert!(event.end_date >= event.start_date);
        assert!(event.outcome.is_none());
    }

    #[test]
    fn test_serialization_skips_empty_fields() {
        let records = vec![update_record()];
        let event = AuditEvent::new("Shop:shop", correlation(), records, Utc::now());
        let value = serde_json::to_value(&event).unwrap();

        assert!(value.get("transaction_id").is_none());
        assert!(value["entries"][0].get("validation_results").is_none());
        assert!(value["entries"][0].get("entity").is_none());
        assert_eq!(value["entries"][0]["action"], json!("Update"));

        let back: AuditEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back.entries, event.entries);
    }

    #[test]
    fn test_column_order_preserved() {
        let record = update_record();
        let json = serde_json::to_string(&record.column_values).unwrap();
        assert_eq!(json, r#"{"Id":7,"Status":"shipped"}"#);
    }

    #[test]
    fn test_complete_records_failure() {
        let mut event = AuditEvent::new("Shop:shop", correlation(), vec![], Utc::now());
        let result: Result<usize, AuditError> = Err(AuditError::Commit("deadlock".into()));
        event.complete(CommitOutcome::from_result(&result));

        let outcome = event.outcome.as_ref().unwrap();
        assert!(!outcome.success);
        assert_eq!(
            outcome.error_message.as_deref(),
            Some("Commit failed: deadlock")
        );
        assert!(event.format_human_readable().contains("FAILED"));
    }

    #[test]
    fn test_human_readable_format() {
        let mut record = update_record();
        record.valid = false;
        record.validation_results = vec!["The Status field is required.".into()];
        let event = AuditEvent::new("Shop:shop", correlation(), vec![record], Utc::now());

        let formatted = event.format_human_readable();
        assert!(formatted.contains("Shop:shop"));
        assert!(formatted.contains("Update Orders [Id=7]"));
        assert!(formatted.contains("Status: \"open\" -> \"shipped\""));
        assert!(formatted.contains("Invalid: The Status field is required."));
    }
}
