//! uow-audit - audit interceptor for unit-of-work persistence sessions
//!
//! At commit time the interceptor enumerates the session's pending inserts,
//! updates and deletes, extracts column values, changes and primary keys,
//! validates each entity, correlates the connection and transaction, and
//! hands one [`audit::AuditEvent`] to a sink.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `audit`: schemas, change capture, event assembly, interceptor, sinks
//! - `session`: host traits and the in-memory session
//! - `config`: configuration and path management
//! - `storage`: JSON file helpers
//! - `export`: audit log export (JSON, YAML, CSV)
//! - `cli`: command handlers for the binary
//! - `logging`: tracing subscriber setup
//! - `error`: custom error types
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use uow_audit::audit::{AuditInterceptor, CommitHook, EventAssembler, MemorySink};
//!
//! let assembler = EventAssembler::new(Arc::new(registry), settings.audit.clone());
//! let interceptor = AuditInterceptor::new(assembler, MemorySink::new(), CommitHook::PostCommit);
//! interceptor.save_changes(&mut session)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod session;
pub mod storage;

pub use error::{AuditError, AuditResult};
