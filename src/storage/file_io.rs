//! File I/O helpers for settings, change sets and line-delimited logs
//!
//! JSON documents are written atomically (temp file + rename) so a crash
//! never leaves a half-written settings file behind.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::AuditError;

/// Read a JSON document, failing if the file doesn't exist
pub fn read_json_required<T, P>(path: P) -> Result<T, AuditError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let file = File::open(path)
        .map_err(|e| AuditError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AuditError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write a JSON document atomically
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), AuditError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AuditError::Storage(format!("Failed to create directory {}: {}", parent.display(), e))
        })?;
    }

    // Same directory as the target, so the rename stays on one filesystem
    let temp_path = temp_path_for(path);

    let file = File::create(&temp_path)
        .map_err(|e| AuditError::Storage(format!("Failed to create temp file: {}", e)))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| AuditError::Storage(format!("Failed to serialize data: {}", e)))?;
    writer
        .flush()
        .map_err(|e| AuditError::Storage(format!("Failed to flush data: {}", e)))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| AuditError::Storage(format!("Failed to sync data: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        AuditError::Storage(format!("Failed to rename temp file: {}", e))
    })
}

/// Append pre-serialized lines to a file and flush once
pub fn append_lines<P, I>(path: P, lines: I) -> Result<(), AuditError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = String>,
{
    let path = path.as_ref();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AuditError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    for line in lines {
        writeln!(file, "{}", line)
            .map_err(|e| AuditError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
    }

    file.flush()
        .map_err(|e| AuditError::Io(format!("Failed to flush {}: {}", path.display(), e)))
}

/// Parse every non-blank line of a JSON-lines file
///
/// A missing file yields an empty list.
pub fn read_json_lines<T, P>(path: P) -> Result<Vec<T>, AuditError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)
        .map_err(|e| AuditError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut items = Vec::new();
    for (line_num, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| {
            AuditError::Io(format!("Failed to read line {}: {}", line_num + 1, e))
        })?;

        if line.trim().is_empty() {
            continue;
        }

        let item = serde_json::from_str(&line).map_err(|e| {
            AuditError::Json(format!("Failed to parse line {}: {}", line_num + 1, e))
        })?;
        items.push(item);
    }

    Ok(items)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}
