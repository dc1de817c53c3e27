//! Persisted fetch-coverage boundary between runs.

use std::fs;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::tree::WorkingTree;

/// Upper bound of change coverage as of the previous successful run.
///
/// An absent or unreadable file reads as an empty watermark, which the
/// fetcher interprets as "no update-time filter". The durable copy is
/// whatever gets committed and pushed with the tree, so a crashed run never
/// advances it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Watermark {
    pub last_updated: Option<DateTime<Utc>>,
}

impl Watermark {
    pub fn read(tree: &WorkingTree, file_name: &str) -> Self {
        let path = tree.root().join(file_name);
        match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Err(_) => {
                debug!(file_name, "No previous watermark");
                Self::default()
            }
        }
    }

    /// Persist the new coverage boundary. Called once per run, after every
    /// collection has been fetched and written, with the run's start time so
    /// changes made concurrently with the run are re-covered next time.
    pub fn write(tree: &WorkingTree, file_name: &str, timestamp: DateTime<Utc>) -> Result<()> {
        let watermark = Watermark {
            last_updated: Some(timestamp),
        };
        let path = tree.root().join(file_name);
        fs::write(&path, serde_json::to_vec_pretty(&watermark)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let tree = WorkingTree::new(dir.path());

        let watermark = Watermark::read(&tree, ".meta-repo.json");
        assert!(watermark.last_updated.is_none());
    }

    #[test]
    fn test_roundtrip() {
        let dir = TempDir::new().unwrap();
        let tree = WorkingTree::new(dir.path());
        let instant: DateTime<Utc> = "2024-01-01T00:00:00Z".parse().unwrap();

        Watermark::write(&tree, ".meta-repo.json", instant).unwrap();
        let watermark = Watermark::read(&tree, ".meta-repo.json");

        assert_eq!(watermark.last_updated, Some(instant));
    }

    #[test]
    fn test_garbage_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let tree = WorkingTree::new(dir.path());
        fs::write(dir.path().join(".meta-repo.json"), "not json at all").unwrap();

        let watermark = Watermark::read(&tree, ".meta-repo.json");
        assert!(watermark.last_updated.is_none());
    }

    #[test]
    fn test_file_uses_camel_case_field() {
        let dir = TempDir::new().unwrap();
        let tree = WorkingTree::new(dir.path());
        let instant: DateTime<Utc> = "2024-01-01T00:00:00Z".parse().unwrap();

        Watermark::write(&tree, ".meta-repo.json", instant).unwrap();

        let written = fs::read_to_string(dir.path().join(".meta-repo.json")).unwrap();
        assert!(written.contains("lastUpdated"));
    }
}
