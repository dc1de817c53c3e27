//! Grouping of ledger entries into ordered, attributed commit batches.

use std::collections::BTreeMap;

use crate::layout::record_path;
use crate::ledger::ChangeLedger;
use crate::models::{CommitGroup, GroupKey};

/// Partition the ledger into commit groups keyed by day and author identity.
///
/// Every ledger entry lands in exactly one group; records without a
/// timestamp share the single fallback group. Emission order is fixed by
/// `GroupKey`'s ordering, so re-running on the same ledger yields an
/// identical commit sequence. Within a group, file paths keep first-seen
/// order and duplicates collapse.
pub fn build_commit_groups(ledger: &ChangeLedger) -> Vec<CommitGroup> {
    let mut groups: BTreeMap<GroupKey, Vec<String>> = BTreeMap::new();

    for record in ledger.records() {
        let key = GroupKey::for_record(record);
        let files = groups.entry(key).or_default();
        let path = record_path(record);
        if !files.contains(&path) {
            files.push(path);
        }
    }

    groups
        .into_iter()
        .map(|(key, files)| CommitGroup { key, files })
        .collect()
}
