//! Audit log export
//!
//! - JSON: machine-readable, with schema version and counts
//! - YAML: the same document, human-readable, with a header comment
//! - CSV: one row per entity change record (spreadsheet-compatible)

pub mod csv;
pub mod json;
pub mod yaml;

pub use self::csv::export_records_csv;
pub use json::{export_events_json, import_events_json, AuditExport, EXPORT_SCHEMA_VERSION};
pub use yaml::{export_events_yaml, import_events_yaml};
