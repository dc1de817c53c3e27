//! The on-disk mirror owned by a single run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::layout::record_path;
use crate::models::ChangeRecord;

/// Working tree root holding one JSON file per mirrored record plus the
/// watermark file. Owned exclusively by one run for its lifetime.
#[derive(Debug, Clone)]
pub struct WorkingTree {
    root: PathBuf,
}

impl WorkingTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a raw record at its mapped path, creating parent directories.
    /// Returns the relative path that was written.
    pub fn write_record(&self, record: &ChangeRecord, raw: &Value) -> Result<String> {
        let relative = record_path(record);
        let absolute = self.root.join(&relative);
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&absolute, to_pretty_json(raw)?)?;
        Ok(relative)
    }
}

/// Pretty-print with four-space indentation to keep diffs readable across
/// runs.
fn to_pretty_json(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(out)
}
