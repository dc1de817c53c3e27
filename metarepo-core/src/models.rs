use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder author id for records whose author was deleted or never set.
pub const UNKNOWN_ID: &str = "unknown";
/// Placeholder username for records whose author was deleted or never set.
pub const UNKNOWN_USERNAME: &str = "unknown";
/// Placeholder display name for records whose author was deleted or never set.
pub const UNKNOWN_NAME: &str = "Unknown user";

/// Author of a remote change, as recorded by the source system.
///
/// Every field may be absent on the wire; missing fields resolve to the
/// fixed placeholders when the grouping key is derived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRef {
    pub id: Option<String>,
    pub username: Option<String>,
    #[serde(rename = "name")]
    pub display_name: Option<String>,
}

/// One remote object's change-relevant projection.
///
/// Created per run from the raw fetched record and discarded after the run's
/// commits are built; the raw record itself is what lands on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub collection: String,
    pub id: String,
    pub display_name: Option<String>,
    pub hierarchy_level: Option<u32>,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_updated_by: Option<UserRef>,
}

impl ChangeRecord {
    /// Project a raw remote object onto the fields the mirror cares about.
    ///
    /// Records without a string `id` cannot be placed in the tree and yield
    /// `None`; the caller skips them.
    pub fn from_value(collection: &str, value: &Value) -> Option<Self> {
        let id = value.get("id")?.as_str()?.to_string();
        let display_name = value
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);
        let hierarchy_level = value
            .get("level")
            .and_then(Value::as_u64)
            .map(|level| level as u32);
        let last_updated = value
            .get("lastUpdated")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|instant| instant.with_timezone(&Utc));
        let last_updated_by = value
            .get("lastUpdatedBy")
            .and_then(|author| serde_json::from_value(author.clone()).ok());

        Some(Self {
            collection: collection.to_string(),
            id,
            display_name,
            hierarchy_level,
            last_updated,
            last_updated_by,
        })
    }
}

/// Composite grouping key for commit reconstruction.
///
/// A structured tuple rather than a joined string, so identities containing
/// the old join delimiter cannot collide. Ordering is day ascending with the
/// timestamp-less fallback group first, then author identity, which fixes
/// the emitted commit sequence across runs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub day: Option<NaiveDate>,
    pub author_id: String,
    pub username: String,
    pub author_name: String,
}

impl GroupKey {
    pub fn for_record(record: &ChangeRecord) -> Self {
        let author = record.last_updated_by.clone().unwrap_or_default();
        Self {
            day: record.last_updated.map(|instant| instant.date_naive()),
            author_id: author.id.unwrap_or_else(|| UNKNOWN_ID.to_string()),
            username: author
                .username
                .unwrap_or_else(|| UNKNOWN_USERNAME.to_string()),
            author_name: author
                .display_name
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        }
    }

    /// Synthetic author email, stable per identity.
    pub fn author_email(&self) -> String {
        format!("{}@{}", self.username, self.author_id)
    }

    pub fn day_label(&self) -> String {
        match self.day {
            Some(day) => day.format("%Y-%m-%d").to_string(),
            None => "unknown".to_string(),
        }
    }
}

/// A batch of change records destined to become one synthetic commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitGroup {
    pub key: GroupKey,
    /// Relative file paths in first-seen order, deduplicated.
    pub files: Vec<String>,
}

impl CommitGroup {
    /// Author timestamp for the group: the shared day at midnight UTC, or
    /// the Unix epoch for the fallback group of records lacking an update
    /// timestamp. The time of day is synthetic; only the date is real.
    pub fn author_date(&self) -> DateTime<Utc> {
        match self.key.day {
            Some(day) => day.and_time(NaiveTime::MIN).and_utc(),
            None => DateTime::UNIX_EPOCH,
        }
    }

    pub fn message(&self) -> String {
        format!(
            "Metadata changes on {} by {}",
            self.key.day_label(),
            self.key.author_name
        )
    }
}
