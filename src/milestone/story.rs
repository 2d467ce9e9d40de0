//! Grouping of milestone work items into stories.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::tracker::{WorkItem, STORY_TAG_PREFIX};

/// Tag of the pseudo-story that collects items without a story tag.
pub const UNRELATED_TAG: &str = "unrelated-bugs";

/// Display name of the pseudo-story.
pub const UNRELATED_NAME: &str = "Bugs not related to a story";

/// A named group of work items sharing a story tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Story {
    pub tag: String,
    pub name: String,
    /// Items in discovery order.
    pub items: Vec<WorkItem>,
}

impl Story {
    pub fn new(tag: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn is_unrelated(&self) -> bool {
        self.tag == UNRELATED_TAG
    }

    /// Anchor on the stories page: the tag after its first `-`.
    pub fn anchor(&self) -> &str {
        match self.tag.split_once('-') {
            Some((_, anchor)) => anchor,
            None => &self.tag,
        }
    }
}

/// All stories of one report run, keyed by tag.
#[derive(Debug, Clone, Default)]
pub struct StoryBook {
    stories: BTreeMap<String, Story>,
}

impl StoryBook {
    /// Create the configured stories plus the pseudo-story.
    pub fn new<'a>(configured: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut stories = BTreeMap::new();
        for (tag, name) in configured {
            stories.insert(tag.to_string(), Story::new(tag, name));
        }
        stories.insert(
            UNRELATED_TAG.to_string(),
            Story::new(UNRELATED_TAG, UNRELATED_NAME),
        );
        Self { stories }
    }

    /// Append `item` to every story it is tagged with, or to the pseudo-story.
    ///
    /// Story tags that were not configured get a story named after the tag
    /// without its prefix. Returns the tags the item was filed under.
    pub fn assign(&mut self, item: &WorkItem) -> Vec<String> {
        let mut tags: Vec<String> = item.story_tags().map(str::to_string).collect();
        if tags.is_empty() {
            tags.push(UNRELATED_TAG.to_string());
        }
        for tag in &tags {
            let story = self.stories.entry(tag.clone()).or_insert_with(|| {
                let name = tag.strip_prefix(STORY_TAG_PREFIX).unwrap_or(tag);
                tracing::debug!(tag = %tag, "story not configured; created from tag");
                Story::new(tag.clone(), name)
            });
            story.items.push(item.clone());
        }
        tags
    }

    pub fn get(&self, tag: &str) -> Result<&Story> {
        self.stories
            .get(tag)
            .ok_or_else(|| Error::InvalidInput(format!("unknown story tag '{tag}'")))
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    /// Stories in report order: `priority` tags first, then the rest by tag.
    pub fn ordered(&self, priority: &[String]) -> Result<Vec<&Story>> {
        let mut ordered = Vec::with_capacity(self.stories.len());
        for tag in priority {
            let story = self.get(tag)?;
            if !ordered.iter().any(|seen: &&Story| seen.tag == story.tag) {
                ordered.push(story);
            }
        }
        ordered.extend(
            self.stories
                .values()
                .filter(|story| !priority.iter().any(|tag| *tag == story.tag)),
        );
        Ok(ordered)
    }

    /// Report-ordered stories restricted to items assigned to `assignee`.
    /// Stories left without items are dropped.
    pub fn for_assignee(&self, assignee: &str, priority: &[String]) -> Result<Vec<Story>> {
        Ok(self
            .ordered(priority)?
            .into_iter()
            .filter_map(|story| {
                let items: Vec<WorkItem> = story
                    .items
                    .iter()
                    .filter(|item| item.assignee.as_deref() == Some(assignee))
                    .cloned()
                    .collect();
                if items.is_empty() {
                    None
                } else {
                    Some(Story {
                        tag: story.tag.clone(),
                        name: story.name.clone(),
                        items,
                    })
                }
            })
            .collect())
    }
}
