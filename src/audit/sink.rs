//! Audit sinks
//!
//! A sink receives each finished [`AuditEvent`]. Sinks are shared between
//! concurrent sessions and so take `&self`.

use std::future::Future;
use std::sync::Mutex;

use super::event::AuditEvent;
use crate::error::{AuditError, AuditResult};

/// Destination for audit events
pub trait AuditSink: Send + Sync {
    fn write(&self, event: &AuditEvent) -> AuditResult<()>;
}

/// Destination for audit events on the asynchronous save path
pub trait AsyncAuditSink: Send + Sync {
    fn write_async(&self, event: &AuditEvent) -> impl Future<Output = AuditResult<()>> + Send;
}

impl<S: AuditSink + ?Sized> AuditSink for Box<S> {
    fn write(&self, event: &AuditEvent) -> AuditResult<()> {
        (**self).write(event)
    }
}

/// Keeps events in memory
///
/// Used for dry runs and by tests that inspect what was recorded.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far, oldest first
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of events recorded
    pub fn len(&self) -> usize {
        match self.events.lock() {
            Ok(events) => events.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// True until the first event is written
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, event: &AuditEvent) -> AuditResult<()> {
        self.events
            .lock()
            .map_err(|_| AuditError::Sink("Memory sink lock poisoned".into()))?
            .push(event.clone());
        Ok(())
    }
}

impl AuditSink for MemorySink {
    fn write(&self, event: &AuditEvent) -> AuditResult<()> {
        self.push(event)
    }
}

impl AsyncAuditSink for MemorySink {
    async fn write_async(&self, event: &AuditEvent) -> AuditResult<()> {
        self.push(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::correlation::Correlation;
    use chrono::Utc;
    use std::sync::Arc;

    fn event(event_type: &str) -> AuditEvent {
        AuditEvent::new(event_type, Correlation::default(), Vec::new(), Utc::now())
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());

        sink.write(&event("A:db")).unwrap();
        sink.write(&event("B:db")).unwrap();

        let types: Vec<String> = sink.events().into_iter().map(|e| e.event_type).collect();
        assert_eq!(types, vec!["A:db", "B:db"]);
    }

    #[test]
    fn test_boxed_sink() {
        let sink: Box<dyn AuditSink> = Box::new(MemorySink::new());
        assert!(sink.write(&event("A:db")).is_ok());
    }

    #[test]
    fn test_len_after_poisoned_lock() {
        let sink = Arc::new(MemorySink::new());
        sink.write(&event("A:db")).unwrap();

        let holder = Arc::clone(&sink);
        let panicked = std::thread::spawn(move || {
            let _guard = holder.events.lock().unwrap();
            panic!("writer crashed while holding the lock");
        })
        .join();
        assert!(panicked.is_err());

        assert_eq!(sink.len(), 1);
        assert!(!sink.is_empty());
        assert_eq!(sink.events().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_sink_async() {
        let sink = MemorySink::new();
        sink.write_async(&event("A:db")).await.unwrap();
        assert_eq!(sink.len(), 1);
    }
}
