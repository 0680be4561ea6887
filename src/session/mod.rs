//! Host persistence session model
//!
//! The interceptor never talks to a concrete ORM. It consumes the traits in
//! this module: a [`UnitOfWork`] that enumerates [`TrackedEntry`] values,
//! exposes its [`DbConnection`], and commits. [`MemorySession`] is a small
//! in-process host used by the CLI replay command and the tests.

pub mod changeset;
pub mod connection;
pub mod entry;
pub mod memory;

pub use changeset::ChangeSet;
pub use connection::{DbConnection, MemoryConnection, TransactionHandle};
pub use entry::{Entity, EntityEntry, EntityState, PropertyEntry, TrackedEntry};
pub use memory::MemorySession;

use crate::error::AuditResult;

/// A session's pending unit of work
pub trait UnitOfWork {
    /// Name of the session type, used in the event type
    fn context_name(&self) -> &str;

    /// Tracked entries in tracker order
    fn entries(&self) -> Vec<&dyn TrackedEntry>;

    fn connection(&self) -> &dyn DbConnection;

    /// Persist pending changes, returning the number of rows written
    fn commit(&mut self) -> AuditResult<usize>;
}
