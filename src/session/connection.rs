//! Connection and transaction handles
//!
//! Providers differ in what they expose: some hand out connection and
//! transaction ids directly, others only a native handle or session token
//! from which an id has to be derived.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provider view of the transaction currently open on a connection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHandle {
    /// Id reported by the provider, when it exposes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    /// Provider-internal transaction pointer or counter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_handle: Option<u64>,

    /// Server session token bound to the transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

/// What the interceptor needs from the session's database connection
pub trait DbConnection {
    /// Database (catalog) name
    fn database(&self) -> Option<&str>;

    /// Client-visible connection id, if the provider exposes one
    fn client_connection_id(&self) -> Option<&str>;

    /// The active transaction, or `None` in autocommit mode
    fn current_transaction(&self) -> Option<&TransactionHandle>;
}

/// Connection used by the in-memory session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConnection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    database: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    connection_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    transaction: Option<TransactionHandle>,

    #[serde(default)]
    next_native_handle: u64,
}

impl MemoryConnection {
    /// Open a connection to a database with a fresh connection id
    pub fn open(database: impl Into<String>) -> Self {
        Self {
            database: Some(database.into()),
            connection_id: Some(Uuid::new_v4().to_string()),
            transaction: None,
            next_native_handle: 1,
        }
    }

    /// Connection for a provider that exposes no connection id
    pub fn anonymous(database: impl Into<String>) -> Self {
        Self {
            connection_id: None,
            ..Self::open(database)
        }
    }

    /// Start a transaction, replacing any handle already open
    pub fn begin_transaction(&mut self) -> &TransactionHandle {
        let native = self.next_native_handle;
        self.next_native_handle += 1;

        self.transaction.insert(TransactionHandle {
            transaction_id: Some(Uuid::new_v4().to_string()),
            native_handle: Some(native),
            session_token: Some(Uuid::new_v4().simple().to_string()),
        })
    }

    /// Attach a handle supplied by the caller
    pub fn use_transaction(&mut self, handle: TransactionHandle) {
        self.transaction = Some(handle);
    }

    /// Close the active transaction
    pub fn end_transaction(&mut self) -> Option<TransactionHandle> {
        self.transaction.take()
    }
}

impl DbConnection for MemoryConnection {
    fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    fn client_connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    fn current_transaction(&self) -> Option<&TransactionHandle> {
        self.transaction.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_has_connection_id_and_no_transaction() {
        let conn = MemoryConnection::open("shop");
        assert_eq!(conn.database(), Some("shop"));
        assert!(conn.client_connection_id().is_some());
        assert!(conn.current_transaction().is_none());
    }

    #[test]
    fn test_begin_and_end_transaction() {
        let mut conn = MemoryConnection::open("shop");
        let first = conn.begin_transaction().clone();
        assert_eq!(first.native_handle, Some(1));
        assert!(first.transaction_id.is_some());

        conn.end_transaction();
        let second = conn.begin_transaction().clone();
        assert_eq!(second.native_handle, Some(2));
        assert_ne!(first.transaction_id, second.transaction_id);
    }

    #[test]
    fn test_anonymous_connection() {
        let conn = MemoryConnection::anonymous("shop");
        assert!(conn.client_connection_id().is_none());
    }

    #[test]
    fn test_deserialize_minimal() {
        let conn: MemoryConnection = serde_json::from_str(r#"{"database": "shop"}"#).unwrap();
        assert_eq!(conn.database(), Some("shop"));
        assert!(conn.client_connection_id().is_none());
    }
}
