//! Annotate free text with bug titles.
//!
//! Every bug reference (`bug 42`, `Bug #42`, `bug number. 42`, references
//! split by `<br/>`) gets the bug's title appended in parentheses. Bugs with
//! no known title, including private ones, are shown as `(Private)`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::milestone::ItemId;
use crate::tracker::TrackerRecord;

const PRIVATE_TITLE: &str = "Private";

fn bug_reference_regex() -> &'static Regex {
    static BUG_REF_RE: OnceLock<Regex> = OnceLock::new();
    BUG_REF_RE.get_or_init(|| {
        Regex::new(
            r"[Bb]ug(?:\s|<br\s*/>)*(?:#|report|number\.?|num\.?|no\.?)?(?:\s|<br\s*/>)*(?P<bugnum>\d+)",
        )
        .expect("bug reference regex should compile")
    })
}

/// Known bug titles.
#[derive(Debug, Clone, Default)]
pub struct TitleIndex {
    titles: HashMap<ItemId, String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TitleSource {
    Map(BTreeMap<String, String>),
    Export(Vec<TrackerRecord>),
}

impl TitleIndex {
    pub fn insert(&mut self, id: ItemId, title: impl Into<String>) {
        self.titles.insert(id, title.into());
    }

    pub fn title(&self, id: ItemId) -> &str {
        self.titles
            .get(&id)
            .map(String::as_str)
            .unwrap_or(PRIVATE_TITLE)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Parse either a `{"42": "title"}` map or a tracker export array.
    /// Private bugs in an export are left out.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut index = TitleIndex::default();
        match serde_json::from_str::<TitleSource>(json)? {
            TitleSource::Map(map) => {
                for (key, title) in map {
                    let id = key.trim().parse::<ItemId>().map_err(|_| {
                        Error::InvalidInput(format!("title key '{key}' is not a bug number"))
                    })?;
                    index.insert(id, title);
                }
            }
            TitleSource::Export(records) => {
                for record in records.into_iter().filter(|record| !record.private) {
                    index.insert(record.id, record.title);
                }
            }
        }
        Ok(index)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let index = Self::from_json(&content)?;
        tracing::debug!(path = %path.display(), count = index.len(), "loaded bug titles");
        Ok(index)
    }
}

/// Outcome of annotating a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotated {
    pub text: String,
    /// Bug ids referenced, in order of appearance.
    pub references: Vec<ItemId>,
}

/// Append `(title)` after every bug reference in `text`.
pub fn annotate(text: &str, titles: &TitleIndex) -> Annotated {
    let mut references = Vec::new();
    let annotated = bug_reference_regex().replace_all(text, |caps: &Captures| {
        let matched = &caps[0];
        match caps["bugnum"].parse::<ItemId>() {
            Ok(id) => {
                references.push(id);
                format!("{matched} ({})", titles.title(id))
            }
            Err(_) => format!("{matched} ({PRIVATE_TITLE})"),
        }
    });
    Annotated {
        text: annotated.into_owned(),
        references,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles() -> TitleIndex {
        let mut index = TitleIndex::default();
        index.insert(42, "Crash on start");
        index.insert(7, "Typo in help");
        index
    }

    #[test]
    fn appends_titles_after_references() {
        let out = annotate("Fixed bug 42 and Bug #7 today.", &titles());
        assert_eq!(
            out.text,
            "Fixed bug 42 (Crash on start) and Bug #7 (Typo in help) today."
        );
        assert_eq!(out.references, vec![42, 7]);
    }

    #[test]
    fn understands_spelled_out_markers() {
        let out = annotate("see bug number. 42, bug no.7, bug report 42", &titles());
        assert_eq!(
            out.text,
            "see bug number. 42 (Crash on start), bug no.7 (Typo in help), bug report 42 (Crash on start)"
        );
    }

    #[test]
    fn understands_html_line_breaks() {
        let out = annotate("bug<br/>42", &titles());
        assert_eq!(out.text, "bug<br/>42 (Crash on start)");
    }

    #[test]
    fn unknown_bugs_are_private() {
        let out = annotate("bug 999", &titles());
        assert_eq!(out.text, "bug 999 (Private)");
    }

    #[test]
    fn text_without_references_is_unchanged() {
        let out = annotate("debugging 42 things", &titles());
        assert_eq!(out.text, "debugging 42 things");
        assert!(out.references.is_empty());
    }

    #[test]
    fn title_index_reads_map_and_export() {
        let map = TitleIndex::from_json(r#"{"42": "Crash on start"}"#).unwrap();
        assert_eq!(map.title(42), "Crash on start");

        let export = TitleIndex::from_json(
            r#"[{"id": 1, "title": "Public"}, {"id": 2, "title": "Hidden", "private": true}]"#,
        )
        .unwrap();
        assert_eq!(export.title(1), "Public");
        assert_eq!(export.title(2), "Private");
    }

    #[test]
    fn title_index_rejects_non_numeric_keys() {
        let err = TitleIndex::from_json(r#"{"abc": "x"}"#).expect_err("bad key");
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
