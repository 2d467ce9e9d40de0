//! Work items as exported from the bug tracker.
//!
//! The export is a JSON array of bug task records. Raw timestamps are kept as
//! strings on the wire and resolved into calendar days when converted to
//! [`WorkItem`].

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::parse_optional_date;
use crate::error::{Error, Result};
use crate::milestone::ItemId;

/// Prefix marking a tag as a story tag.
pub const STORY_TAG_PREFIX: &str = "story-";

/// A bug task record exactly as it appears in the tracker export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerRecord {
    pub id: ItemId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Explicit assignee name; wins over `assignee_link`.
    #[serde(default)]
    pub assignee: Option<String>,
    /// Link to the assignee's profile, e.g. `https://host/~alice`.
    #[serde(default)]
    pub assignee_link: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub date_in_progress: Option<String>,
    #[serde(default)]
    pub date_fix_committed: Option<String>,
    #[serde(default)]
    pub date_fix_released: Option<String>,
    #[serde(default)]
    pub date_closed: Option<String>,
}

/// Timestamp fields that may mark a bug task as closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedDateField {
    FixCommitted,
    FixReleased,
    Closed,
}

/// Candidate closed fields in priority order. `date_closed` comes last
/// because trackers do not always set it.
pub const CLOSED_DATE_PRIORITY: [ClosedDateField; 3] = [
    ClosedDateField::FixCommitted,
    ClosedDateField::FixReleased,
    ClosedDateField::Closed,
];

impl ClosedDateField {
    fn value(self, record: &TrackerRecord) -> Option<&str> {
        match self {
            ClosedDateField::FixCommitted => record.date_fix_committed.as_deref(),
            ClosedDateField::FixReleased => record.date_fix_released.as_deref(),
            ClosedDateField::Closed => record.date_closed.as_deref(),
        }
    }
}

/// A milestone work item with resolved lifecycle days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkItem {
    pub id: ItemId,
    pub title: String,
    pub tags: Vec<String>,
    pub assignee: Option<String>,
    pub private: bool,
    pub added: Option<NaiveDate>,
    pub started: Option<NaiveDate>,
    pub done: Option<NaiveDate>,
}

impl WorkItem {
    /// Minimal item with no tags, assignee or lifecycle dates.
    pub fn new(id: ItemId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            tags: Vec::new(),
            assignee: None,
            private: false,
            added: None,
            started: None,
            done: None,
        }
    }

    /// Tags that name a story, in the order the tracker lists them.
    pub fn story_tags(&self) -> impl Iterator<Item = &str> {
        self.tags
            .iter()
            .map(String::as_str)
            .filter(|tag| tag.starts_with(STORY_TAG_PREFIX))
    }

    /// Title to show for this item; private bugs never reveal theirs.
    pub fn display_title(&self) -> &str {
        if self.private {
            "Private"
        } else {
            &self.title
        }
    }
}

impl TryFrom<TrackerRecord> for WorkItem {
    type Error = Error;

    fn try_from(record: TrackerRecord) -> Result<Self> {
        let context = |err: Error| match err {
            Error::InvalidInput(message) => {
                Error::InvalidInput(format!("bug {}: {message}", record.id))
            }
            other => other,
        };

        let added = parse_optional_date(record.date_created.as_deref()).map_err(context)?;
        let started = parse_optional_date(record.date_in_progress.as_deref()).map_err(context)?;
        let done = closed_date(&record).map_err(context)?;
        let assignee = record
            .assignee
            .clone()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| record.assignee_link.as_deref().and_then(assignee_from_link));

        let mut seen = HashSet::new();
        let tags = record
            .tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty() && seen.insert(tag.to_string()))
            .map(str::to_string)
            .collect();

        Ok(WorkItem {
            id: record.id,
            title: record.title,
            tags,
            assignee,
            private: record.private,
            added,
            started,
            done,
        })
    }
}

/// First non-empty closed timestamp in [`CLOSED_DATE_PRIORITY`] order.
pub fn closed_date(record: &TrackerRecord) -> Result<Option<NaiveDate>> {
    for field in CLOSED_DATE_PRIORITY {
        if let Some(date) = parse_optional_date(field.value(record))? {
            return Ok(Some(date));
        }
    }
    Ok(None)
}

/// Extract the person name from a profile link.
///
/// The name is the last path segment with any leading `~` removed, which
/// avoids looking the person up in the tracker.
pub fn assignee_from_link(link: &str) -> Option<String> {
    let segment = link.trim().trim_end_matches('/').rsplit('/').next()?;
    let name = segment.trim_start_matches('~');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Parse a tracker export. Ids must be unique.
pub fn parse_items(json: &str) -> Result<Vec<WorkItem>> {
    let records: Vec<TrackerRecord> = serde_json::from_str(json)?;
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id) {
            return Err(Error::InvalidInput(format!(
                "bug {} appears more than once in the export",
                record.id
            )));
        }
        items.push(WorkItem::try_from(record)?);
    }
    Ok(items)
}

/// Load a tracker export from disk.
pub fn load_items(path: &Path) -> Result<Vec<WorkItem>> {
    let content = std::fs::read_to_string(path)?;
    let items = parse_items(&content)?;
    tracing::debug!(path = %path.display(), count = items.len(), "loaded work items");
    Ok(items)
}
