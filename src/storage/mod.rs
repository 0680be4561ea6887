//! Storage layer for uow-audit
//!
//! JSON documents with atomic writes, and append-only JSON-lines files.

pub mod file_io;

pub use file_io::{append_lines, read_json_lines, read_json_required, write_json_atomic};
