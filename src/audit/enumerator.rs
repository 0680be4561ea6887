//! Change enumeration
//!
//! Picks the tracked entries that will be written by the commit and that
//! the inclusion policy wants audited.

use super::event::MutationKind;
use super::schema::{AuditAttribute, EntitySchema, SchemaRegistry};
use crate::config::{AuditMode, AuditSettings};
use crate::error::AuditResult;
use crate::session::TrackedEntry;

/// A tracked entry selected for auditing, with its schema
pub struct PendingChange<'e, 's> {
    pub entry: &'e dyn TrackedEntry,
    pub schema: &'s EntitySchema,
    pub kind: MutationKind,
}

/// Whether the inclusion policy audits an entity type
pub fn is_audited(schema: &EntitySchema, settings: &AuditSettings) -> bool {
    let type_name = schema.type_name();
    match settings.mode {
        AuditMode::All => true,
        AuditMode::OptOut => {
            schema.audit_attribute() != AuditAttribute::Ignore
                && !settings.ignored_types.iter().any(|t| t == type_name)
        }
        AuditMode::OptIn => {
            schema.audit_attribute() == AuditAttribute::Include
                || settings.included_types.iter().any(|t| t == type_name)
        }
    }
}

/// Select the pending, audited entries, in tracker order
///
/// Entries without a pending write are skipped without a schema lookup; a
/// pending entry of an unregistered type is an error.
pub fn pending_changes<'e, 's>(
    entries: &[&'e dyn TrackedEntry],
    registry: &'s SchemaRegistry,
    settings: &AuditSettings,
) -> AuditResult<Vec<PendingChange<'e, 's>>> {
    let mut selected = Vec::new();

    for &entry in entries {
        let Some(kind) = MutationKind::from_state(entry.state()) else {
            continue;
        };

        let schema = registry.require(entry.entity_type())?;
        if !is_audited(schema, settings) {
            tracing::trace!(entity_type = entry.entity_type(), "excluded by audit mode");
            continue;
        }

        selected.push(PendingChange {
            entry,
            schema,
            kind,
        });
    }

    Ok(selected)
}
