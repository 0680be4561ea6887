//! Append-only audit log
//!
//! Writes each audit event as a single JSON line and flushes immediately.

use std::fs;
use std::path::{Path, PathBuf};

use super::event::AuditEvent;
use super::sink::{AsyncAuditSink, AuditSink};
use crate::error::{AuditError, AuditResult};
use crate::storage::file_io::{append_lines, read_json_lines};

/// Audit sink backed by a line-delimited JSON (JSONL) file
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    log_path: PathBuf,
}

impl JsonLinesSink {
    /// Create a sink that appends to the given log file
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
        }
    }

    /// Write several events with a single flush
    pub fn write_batch(&self, events: &[AuditEvent]) -> AuditResult<()> {
        if events.is_empty() {
            return Ok(());
        }

        let lines = events
            .iter()
            .map(|event| {
                serde_json::to_string(event).map_err(|e| {
                    AuditError::Json(format!("Failed to serialize audit event: {}", e))
                })
            })
            .collect::<AuditResult<Vec<_>>>()?;

        if let Some(parent) = self.log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        append_lines(&self.log_path, lines)
            .map_err(|e| AuditError::Sink(format!("Failed to append to audit log: {}", e)))
    }

    /// All events in the log, oldest first
    pub fn read_all(&self) -> AuditResult<Vec<AuditEvent>> {
        read_json_lines(&self.log_path)
    }

    /// The most recent `count` events, oldest first
    pub fn read_recent(&self, count: usize) -> AuditResult<Vec<AuditEvent>> {
        let mut events = self.read_all()?;
        let start = events.len().saturating_sub(count);
        Ok(events.split_off(start))
    }

    /// Number of events in the log; a missing log counts as empty
    pub fn event_count(&self) -> AuditResult<usize> {
        Ok(self.read_all()?.len())
    }

    /// Check if the log file exists
    pub fn exists(&self) -> bool {
        self.log_path.exists()
    }

    /// Path to the log file
    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

impl AuditSink for JsonLinesSink {
    fn write(&self, event: &AuditEvent) -> AuditResult<()> {
        self.write_batch(std::slice::from_ref(event))
    }
}

impl AsyncAuditSink for JsonLinesSink {
    async fn write_async(&self, event: &AuditEvent) -> AuditResult<()> {
        self.write(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::correlation::Correlation;
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_sink() -> (JsonLinesSink, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let sink = JsonLinesSink::new(temp_dir.path().join("audit.log"));
        (sink, temp_dir)
    }

    fn event(n: usize) -> AuditEvent {
        AuditEvent::new(
            format!("Ctx{}:db", n),
            Correlation {
                database: Some("db".into()),
                connection_id: Some("c-1".into()),
                transaction_id: Some(format!("tx-{}", n)),
            },
            Vec::new(),
            Utc::now(),
        )
    }

    #[test]
    fn test_write_and_read() {
        let (sink, _temp) = create_test_sink();
        sink.write(&event(1)).unwrap();

        let events = sink.read_all().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "Ctx1:db");
        assert_eq!(events[0].transaction_id.as_deref(), Some("tx-1"));
    }

    #[test]
    fn test_write_batch() {
        let (sink, _temp) = create_test_sink();
        let events: Vec<AuditEvent> = (0..3).map(event).collect();

        sink.write_batch(&events).unwrap();
        assert_eq!(sink.event_count().unwrap(), 3);
    }

    #[test]
    fn test_read_recent() {
        let (sink, _temp) = create_test_sink();
        for i in 0..10 {
            sink.write(&event(i)).unwrap();
        }

        let recent = sink.read_recent(3).unwrap();
        let types: Vec<&str> = recent.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec!["Ctx7:db", "Ctx8:db", "Ctx9:db"]);
    }

    #[test]
    fn test_empty_log() {
        let (sink, _temp) = create_test_sink();
        assert!(!sink.exists());
        assert_eq!(sink.event_count().unwrap(), 0);
        assert!(sink.read_recent(5).unwrap().is_empty());
    }

    #[test]
    fn test_creates_parent_directory() {
        let temp = TempDir::new().unwrap();
        let sink = JsonLinesSink::new(temp.path().join("nested").join("audit.log"));
        sink.write(&event(1)).unwrap();
        assert!(sink.exists());
    }

    #[test]
    fn test_reopened_log_is_readable() {
        let (sink, temp) = create_test_sink();
        sink.write(&event(1)).unwrap();

        let reopened = JsonLinesSink::new(temp.path().join("audit.log"));
        assert_eq!(reopened.read_all().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_async_write() {
        let (sink, _temp) = create_test_sink();
        sink.write_async(&event(1)).await.unwrap();
        assert_eq!(sink.event_count().unwrap(), 1);
    }
}
