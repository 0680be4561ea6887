//! Unit-of-work auditing
//!
//! Captures the pending inserts, updates and deletes of a persistence
//! session at commit time and turns them into a single [`AuditEvent`].
//!
//! # Architecture
//!
//! - `schema`: entity type descriptors (table, columns, keys, rules, audit attribute)
//! - `enumerator`: selects pending entries under the inclusion policy
//! - `extractor` / `keys`: column values, column changes, primary keys
//! - `validation`: rule and custom validator checks per entity
//! - `correlation`: connection and transaction ids per backend
//! - `assembler`: runs one capture cycle and builds the event
//! - `interceptor`: wraps the commit and feeds a sink
//! - `sink` / `logger`: event destinations
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use uow_audit::audit::{AuditInterceptor, CommitHook, EventAssembler, JsonLinesSink};
//!
//! let assembler = EventAssembler::new(Arc::new(registry), settings.audit.clone());
//! let interceptor = AuditInterceptor::new(
//!     assembler,
//!     JsonLinesSink::new(settings.audit_log_path(&paths)),
//!     CommitHook::PostCommit,
//! );
//! let rows = interceptor.save_changes(&mut session)?;
//! ```

mod assembler;
mod correlation;
mod diff;
mod enumerator;
mod event;
mod extractor;
mod interceptor;
mod keys;
mod logger;
mod schema;
mod sink;
mod validation;

pub use assembler::{CapturePhase, EventAssembler};
pub use correlation::{
    introspector_for, ConnectionIntrospector, Correlation, DirectIntrospector,
    NativeHandleIntrospector, SessionTokenIntrospector,
};
pub use diff::{detailed_changes, format_key, format_value, summarize_changes};
pub use enumerator::{is_audited, pending_changes, PendingChange};
pub use event::{AuditEvent, ColumnChange, CommitOutcome, EntityChangeRecord, MutationKind};
pub use extractor::{column_changes, column_values};
pub use interceptor::{AuditInterceptor, CommitHook};
pub use keys::resolve_primary_key;
pub use logger::JsonLinesSink;
pub use schema::{
    AuditAttribute, ColumnMapping, EntitySchema, EntitySchemaBuilder, EntityValidator,
    SchemaRegistry, ValidationRule,
};
pub use sink::{AsyncAuditSink, AuditSink, MemorySink};
pub use validation::{validate, ValidationOutcome};
