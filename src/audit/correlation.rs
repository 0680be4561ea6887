//! Transaction/connection correlation
//!
//! Each supported backend gets a [`ConnectionIntrospector`] that turns the
//! session's connection into correlation ids. Missing ids are expected
//! (autocommit, providers without connection ids) and never fail capture.

use uuid::Uuid;

use crate::config::IntrospectorKind;
use crate::session::{DbConnection, TransactionHandle};

/// Ids linking an audit event to the connection and transaction that wrote it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correlation {
    pub database: Option<String>,
    pub connection_id: Option<String>,
    pub transaction_id: Option<String>,
}

/// Backend-specific extraction of correlation ids
pub trait ConnectionIntrospector: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// Client-visible connection id
    fn connection_id(&self, connection: &dyn DbConnection) -> Option<String> {
        connection.client_connection_id().map(str::to_string)
    }

    /// Id of an open transaction
    fn transaction_id(
        &self,
        transaction: &TransactionHandle,
        connection_id: Option<&str>,
    ) -> Option<String>;

    /// Resolve all correlation fields for a connection
    fn correlate(&self, connection: &dyn DbConnection) -> Correlation {
        let connection_id = self.connection_id(connection);
        if connection_id.is_none() {
            tracing::debug!(
                introspector = self.name(),
                "provider exposes no connection id"
            );
        }

        let transaction_id = match connection.current_transaction() {
            Some(tx) => {
                let id = self.transaction_id(tx, connection_id.as_deref());
                if id.is_none() {
                    tracing::debug!(
                        introspector = self.name(),
                        "active transaction has no resolvable id"
                    );
                }
                id
            }
            None => None,
        };

        Correlation {
            database: connection.database().map(str::to_string),
            connection_id,
            transaction_id,
        }
    }
}

/// Provider exposes transaction ids directly
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectIntrospector;

impl ConnectionIntrospector for DirectIntrospector {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn transaction_id(
        &self,
        transaction: &TransactionHandle,
        _connection_id: Option<&str>,
    ) -> Option<String> {
        transaction.transaction_id.clone()
    }
}

/// Transaction id formed as `{connection_id}_{native_handle}`
///
/// Native handles are only unique per connection, so the connection id is
/// prefixed when the provider reports one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeHandleIntrospector;

impl ConnectionIntrospector for NativeHandleIntrospector {
    fn name(&self) -> &'static str {
        "native_handle"
    }

    fn transaction_id(
        &self,
        transaction: &TransactionHandle,
        connection_id: Option<&str>,
    ) -> Option<String> {
        let native = transaction.native_handle?;
        Some(match connection_id {
            Some(conn) => format!("{}_{}", conn, native),
            None => native.to_string(),
        })
    }
}

/// Transaction id hashed from the server session token
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionTokenIntrospector;

impl ConnectionIntrospector for SessionTokenIntrospector {
    fn name(&self) -> &'static str {
        "session_token"
    }

    fn transaction_id(
        &self,
        transaction: &TransactionHandle,
        _connection_id: Option<&str>,
    ) -> Option<String> {
        let token = transaction.session_token.as_deref()?;
        Some(Uuid::new_v5(&Uuid::NAMESPACE_OID, token.as_bytes()).to_string())
    }
}

/// Introspector for a configured backend
pub fn introspector_for(kind: IntrospectorKind) -> Box<dyn ConnectionIntrospector> {
    match kind {
        IntrospectorKind::Direct => Box::new(DirectIntrospector),
        IntrospectorKind::NativeHandle => Box::new(NativeHandleIntrospector),
        IntrospectorKind::SessionToken => Box::new(SessionTokenIntrospector),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryConnection;

    fn connection_with_tx() -> MemoryConnection {
        let mut conn = MemoryConnection::open("shop");
        conn.use_transaction(TransactionHandle {
            transaction_id: Some("tx-42".into()),
            native_handle: Some(42),
            session_token: Some("token-abc".into()),
        });
        conn
    }

    #[test]
    fn test_direct() {
        let conn = connection_with_tx();
        let corr = DirectIntrospector.correlate(&conn);
        assert_eq!(corr.database.as_deref(), Some("shop"));
        assert_eq!(corr.connection_id.as_deref(), conn.client_connection_id());
        assert_eq!(corr.transaction_id.as_deref(), Some("tx-42"));
    }

    #[test]
    fn test_no_transaction_keeps_connection_id() {
        let conn = MemoryConnection::open("shop");
        for kind in [
            IntrospectorKind::Direct,
            IntrospectorKind::NativeHandle,
            IntrospectorKind::SessionToken,
        ] {
            let corr = introspector_for(kind).correlate(&conn);
            assert!(corr.transaction_id.is_none());
            assert!(corr.connection_id.is_some());
        }
    }

    #[test]
    fn test_native_handle_prefixed_with_connection() {
        let conn = connection_with_tx();
        let corr = NativeHandleIntrospector.correlate(&conn);
        let expected = format!("{}_42", conn.client_connection_id().unwrap());
        assert_eq!(corr.transaction_id, Some(expected));
    }

    #[test]
    fn test_native_handle_without_connection_id() {
        let mut conn = MemoryConnection::anonymous("shop");
        conn.use_transaction(TransactionHandle {
            native_handle: Some(7),
            ..Default::default()
        });
        let corr = NativeHandleIntrospector.correlate(&conn);
        assert!(corr.connection_id.is_none());
        assert_eq!(corr.transaction_id.as_deref(), Some("7"));
    }

    #[test]
    fn test_session_token_is_stable_hash() {
        let conn = connection_with_tx();
        let first = SessionTokenIntrospector.correlate(&conn);
        let second = SessionTokenIntrospector.correlate(&conn);
        assert_eq!(first, second);

        let id = first.transaction_id.unwrap();
        assert_ne!(id, "token-abc");
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_unresolvable_transaction_is_null() {
        let mut conn = MemoryConnection::open("shop");
        conn.use_transaction(TransactionHandle::default());
        for kind in [
            IntrospectorKind::Direct,
            IntrospectorKind::NativeHandle,
            IntrospectorKind::SessionToken,
        ] {
            let corr = introspector_for(kind).correlate(&conn);
            assert!(corr.transaction_id.is_none());
        }
    }
}
