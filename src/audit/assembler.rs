//! Event assembly
//!
//! Runs one capture cycle over a unit of work:
//!
//! ```text
//! Idle -> Scanning -> Empty -> Idle
//!                  -> Extracting -> Correlating -> Validating -> Ready
//! ```
//!
//! The assembler only reads from the session. It holds no per-cycle state,
//! so one instance can serve any number of sessions concurrently.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;

use super::correlation::{introspector_for, ConnectionIntrospector};
use super::enumerator::{pending_changes, PendingChange};
use super::event::{AuditEvent, EntityChangeRecord, MutationKind};
use super::extractor::{column_changes, column_values};
use super::keys::resolve_primary_key;
use super::schema::SchemaRegistry;
use super::validation::validate;
use crate::config::AuditSettings;
use crate::error::AuditResult;
use crate::session::UnitOfWork;

/// Stage of a capture cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    Scanning,
    Empty,
    Extracting,
    Correlating,
    Validating,
    Ready,
}

impl fmt::Display for CapturePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::Empty => "empty",
            Self::Extracting => "extracting",
            Self::Correlating => "correlating",
            Self::Validating => "validating",
            Self::Ready => "ready",
        };
        f.write_str(name)
    }
}

fn enter(phase: CapturePhase) {
    tracing::trace!(%phase, "audit capture");
}

/// Builds one [`AuditEvent`] per commit cycle
pub struct EventAssembler {
    registry: Arc<SchemaRegistry>,
    settings: AuditSettings,
    introspector: Box<dyn ConnectionIntrospector>,
}

impl EventAssembler {
    /// Create an assembler using the introspector named in the settings
    pub fn new(registry: Arc<SchemaRegistry>, settings: AuditSettings) -> Self {
        let introspector = introspector_for(settings.introspector);
        Self {
            registry,
            settings,
            introspector,
        }
    }

    /// Replace the configured introspector
    pub fn with_introspector(mut self, introspector: Box<dyn ConnectionIntrospector>) -> Self {
        self.introspector = introspector;
        self
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Capture the pending changes of a unit of work
    ///
    /// Returns `Ok(None)` when nothing is audited: auditing is disabled, or
    /// no tracked entry passes the inclusion policy with a pending write.
    pub fn create_event<U>(&self, uow: &U) -> AuditResult<Option<AuditEvent>>
    where
        U: UnitOfWork + ?Sized,
    {
        if self.settings.audit_disabled {
            return Ok(None);
        }

        let start_date = Utc::now();

        enter(CapturePhase::Scanning);
        let entries = uow.entries();
        let pending = pending_changes(&entries, &self.registry, &self.settings)?;
        if pending.is_empty() {
            enter(CapturePhase::Empty);
            enter(CapturePhase::Idle);
            return Ok(None);
        }

        enter(CapturePhase::Extracting);
        let mut records = pending
            .iter()
            .map(|change| self.extract(change))
            .collect::<AuditResult<Vec<_>>>()?;

        enter(CapturePhase::Correlating);
        let connection = uow.connection();
        let correlation = self.introspector.correlate(connection);

        enter(CapturePhase::Validating);
        for (record, change) in records.iter_mut().zip(&pending) {
            let outcome = validate(change.schema, change.entry.entity());
            record.valid = outcome.valid;
            record.validation_results = outcome.messages;
        }

        enter(CapturePhase::Ready);
        let event_type = self
            .settings
            .render_event_type(uow.context_name(), correlation.database.as_deref());
        let event = AuditEvent::new(event_type, correlation, records, start_date);

        tracing::info!(
            event_type = %event.event_type,
            entries = event.entries.len(),
            transaction_id = ?event.transaction_id,
            "audit event assembled"
        );

        Ok(Some(event))
    }

    /// Keys, column values and changes for one entry
    fn extract(&self, change: &PendingChange<'_, '_>) -> AuditResult<EntityChangeRecord> {
        let schema = change.schema;
        let entry = change.entry;

        let changes = match change.kind {
            MutationKind::Update => Some(column_changes(entry, schema)?),
            MutationKind::Insert | MutationKind::Delete => None,
        };

        Ok(EntityChangeRecord {
            table: schema.table_name().to_string(),
            action: change.kind,
            primary_key: resolve_primary_key(schema, entry.entity())?,
            column_values: column_values(entry, schema, change.kind)?,
            changes,
            valid: true,
            validation_results: Vec::new(),
            entity: self
                .settings
                .include_entities
                .then(|| entry.entity().snapshot()),
        })
    }
}
