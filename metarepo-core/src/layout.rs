//! Deterministic mapping of change records to relative file paths.

use crate::models::ChangeRecord;

/// Build the relative path for a record:
/// `collection/[level-{n}/]{id}_{name}.json`, or `collection/{id}.json` when
/// the record has no display name.
///
/// The level segment keeps deep hierarchical collections browsable instead of
/// one giant flat directory. The mapping is pure, so commit file lists can be
/// rebuilt from ledger entries alone, without touching the filesystem.
pub fn record_path(record: &ChangeRecord) -> String {
    let file_name = match &record.display_name {
        Some(name) => format!("{}_{}.json", record.id, sanitize_name(name)),
        None => format!("{}.json", record.id),
    };

    match record.hierarchy_level {
        Some(level) => format!("{}/level-{}/{}", record.collection, level, file_name),
        None => format!("{}/{}", record.collection, file_name),
    }
}

/// Display names may contain path separators; replace them so a name never
/// escapes its collection directory.
fn sanitize_name(name: &str) -> String {
    name.replace('/', "-")
}
