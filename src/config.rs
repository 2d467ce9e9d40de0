//! Configuration loading and management
//!
//! Handles parsing of the milestone report configuration (`bugkit.toml`).
//! Relative paths in the file are resolved against the file's directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::dates::parse_iso_date;
use crate::error::{Error, Result};
use crate::milestone::{GridFormat, Window, UNRELATED_TAG};
use crate::tracker::STORY_TAG_PREFIX;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "bugkit.toml";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Milestone being reported on
    pub milestone: MilestoneConfig,

    /// Branch scanned for commit fixes (optional)
    #[serde(default)]
    pub branch: Option<BranchConfig>,

    /// Configured stories, in declaration order
    #[serde(default)]
    pub stories: Vec<StoryConfig>,

    /// Directory the configuration was loaded from
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Milestone-related configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MilestoneConfig {
    /// Milestone name, also the main page name
    pub name: String,

    /// Project the milestone belongs to
    #[serde(default)]
    pub project: String,

    /// First tracked day (YYYY-MM-DD)
    pub start: String,

    /// Last tracked day (YYYY-MM-DD)
    pub end: String,

    /// Release-critical deadline; defaults to `end`
    #[serde(default)]
    pub release_critical: Option<String>,

    /// Page template with `{milestone}` and `{progress_table}` placeholders
    #[serde(default)]
    pub template: Option<PathBuf>,

    /// Wiki page holding story anchors
    #[serde(default = "default_stories_page")]
    pub stories_page: String,

    /// Prefix for bug links
    #[serde(default = "default_bug_url")]
    pub bug_url: String,

    /// Directory receiving rendered pages
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Table markup
    #[serde(default)]
    pub format: GridFormat,

    /// Story tags listed first; defaults to the declared story order
    #[serde(default)]
    pub priority: Vec<String>,
}

fn default_stories_page() -> String {
    "Stories".to_string()
}

fn default_bug_url() -> String {
    "https://launchpad.net/bugs/".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Branch scanned for fix commits
#[derive(Debug, Clone, Deserialize)]
pub struct BranchConfig {
    /// Repository path
    #[serde(default = "default_location")]
    pub location: PathBuf,

    /// Commits reachable from this revision are not scanned
    #[serde(default)]
    pub start_ref: Option<String>,

    /// Tip of the scanned range
    #[serde(default = "default_head")]
    pub head: String,
}

fn default_location() -> PathBuf {
    PathBuf::from(".")
}

fn default_head() -> String {
    "HEAD".to_string()
}

/// A configured story
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoryConfig {
    pub tag: String,
    pub name: String,
}

/// The milestone's dates, parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilestoneDates {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub release_critical: NaiveDate,
}

impl MilestoneDates {
    /// The report window as seen on `today`.
    pub fn window(&self, today: NaiveDate) -> Result<Window> {
        Window::new(self.start, self.end, today, self.release_critical)
    }
}

impl MilestoneConfig {
    pub fn dates(&self) -> Result<MilestoneDates> {
        let parse = |field: &str, value: &str| {
            parse_iso_date(value).map_err(|err| {
                Error::InvalidConfig(format!("milestone.{field}: {err}"))
            })
        };
        let start = parse("start", &self.start)?;
        let end = parse("end", &self.end)?;
        let release_critical = match &self.release_critical {
            Some(value) => parse("release_critical", value)?,
            None => end,
        };
        if start > end {
            return Err(Error::InvalidConfig(format!(
                "milestone.start {start} is after milestone.end {end}"
            )));
        }
        Ok(MilestoneDates {
            start,
            end,
            release_critical,
        })
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    /// Resolve a path from the config file against the file's directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// `(tag, name)` of configured stories in declaration order.
    pub fn story_names(&self) -> impl Iterator<Item = (&str, &str)> {
        self.stories
            .iter()
            .map(|story| (story.tag.as_str(), story.name.as_str()))
    }

    /// Story tags rendered first: explicit priority, else declaration order.
    pub fn priority_order(&self) -> Vec<String> {
        if self.milestone.priority.is_empty() {
            self.stories.iter().map(|story| story.tag.clone()).collect()
        } else {
            self.milestone.priority.clone()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.milestone.name.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "milestone.name cannot be empty".to_string(),
            ));
        }
        if self.milestone.name.contains(['/', '\\']) {
            return Err(Error::InvalidConfig(format!(
                "milestone.name '{}' cannot contain path separators",
                self.milestone.name
            )));
        }
        self.milestone.dates()?;

        let mut seen = HashSet::new();
        for story in &self.stories {
            let tag = story.tag.trim();
            if tag.is_empty() {
                return Err(Error::InvalidConfig(
                    "stories.tag cannot be empty".to_string(),
                ));
            }
            if tag != story.tag {
                return Err(Error::InvalidConfig(format!(
                    "stories.tag '{}' has surrounding whitespace",
                    story.tag
                )));
            }
            if tag == UNRELATED_TAG {
                return Err(Error::InvalidConfig(format!(
                    "stories.tag '{UNRELATED_TAG}' is reserved"
                )));
            }
            if !tag.starts_with(STORY_TAG_PREFIX) {
                return Err(Error::InvalidConfig(format!(
                    "stories.tag '{tag}' must start with '{STORY_TAG_PREFIX}'"
                )));
            }
            if !seen.insert(tag.to_string()) {
                return Err(Error::InvalidConfig(format!(
                    "stories has duplicate tag '{tag}'"
                )));
            }
        }

        for tag in &self.milestone.priority {
            if tag != UNRELATED_TAG && !seen.contains(tag.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "milestone.priority '{tag}' is not a configured story"
                )));
            }
        }

        if let Some(branch) = &self.branch {
            if branch.head.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "branch.head cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MINIMAL: &str = r#"
[milestone]
name = "0.9"
start = "2009-07-01"
end = "2009-07-31"
"#;

    fn write(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, content.trim()).expect("write config");
        path
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn defaults_are_expected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load(&write(dir.path(), MINIMAL)).expect("load");
        assert_eq!(cfg.milestone.stories_page, "Stories");
        assert_eq!(cfg.milestone.bug_url, "https://launchpad.net/bugs/");
        assert_eq!(cfg.milestone.output_dir, PathBuf::from("."));
        assert_eq!(cfg.milestone.format, GridFormat::Moin);
        assert!(cfg.milestone.template.is_none());
        assert!(cfg.branch.is_none());
        assert!(cfg.stories.is_empty());

        let dates = cfg.milestone.dates().expect("dates");
        assert_eq!(dates.start, ymd(2009, 7, 1));
        assert_eq!(dates.release_critical, ymd(2009, 7, 31));
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let content = r#"
[milestone]
name = "0.9"
project = "launchpadlib"
start = "2009-07-01"
end = "2009-07-31"
release_critical = "2009-07-24"
template = "progress.tmpl"
stories_page = "Milestone/Stories"
bug_url = "https://bugs.example.net/"
output_dir = "pages"
format = "text"
priority = ["story-api", "story-login"]

[branch]
location = "../trunk"
start_ref = "v0.8"

[[stories]]
tag = "story-login"
name = "Log in with OpenID"

[[stories]]
tag = "story-api"
name = "Public API"
"#;
        let cfg = Config::load(&write(dir.path(), content)).expect("load");
        assert_eq!(cfg.milestone.project, "launchpadlib");
        assert_eq!(cfg.milestone.format, GridFormat::Text);
        assert_eq!(
            cfg.milestone.dates().unwrap().release_critical,
            ymd(2009, 7, 24)
        );
        let branch = cfg.branch.as_ref().expect("branch");
        assert_eq!(branch.start_ref.as_deref(), Some("v0.8"));
        assert_eq!(branch.head, "HEAD");
        assert_eq!(
            cfg.story_names().collect::<Vec<_>>(),
            vec![("story-login", "Log in with OpenID"), ("story-api", "Public API")]
        );
        assert_eq!(
            cfg.priority_order(),
            vec!["story-api".to_string(), "story-login".to_string()]
        );
        assert_eq!(
            cfg.resolve_path(Path::new("pages")),
            dir.path().join("pages")
        );
    }

    #[test]
    fn priority_defaults_to_declaration_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let content = format!(
            "{MINIMAL}\n[[stories]]\ntag = \"story-b\"\nname = \"B\"\n\n[[stories]]\ntag = \"story-a\"\nname = \"A\"\n"
        );
        let cfg = Config::load(&write(dir.path(), &content)).expect("load");
        assert_eq!(
            cfg.priority_order(),
            vec!["story-b".to_string(), "story-a".to_string()]
        );
    }

    fn assert_invalid(content: &str) {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Config::load(&write(dir.path(), content)).expect_err("invalid config");
        match err {
            Error::InvalidConfig(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn inverted_window_rejected() {
        assert_invalid(
            r#"
[milestone]
name = "0.9"
start = "2009-07-31"
end = "2009-07-01"
"#,
        );
    }

    #[test]
    fn malformed_date_rejected() {
        assert_invalid(
            r#"
[milestone]
name = "0.9"
start = "July 1st"
end = "2009-07-31"
"#,
        );
    }

    #[test]
    fn story_tag_rules_enforced() {
        assert_invalid(&format!(
            "{MINIMAL}\n[[stories]]\ntag = \"login\"\nname = \"Log in\"\n"
        ));
        assert_invalid(&format!(
            "{MINIMAL}\n[[stories]]\ntag = \"unrelated-bugs\"\nname = \"Other\"\n"
        ));
        assert_invalid(&format!(
            "{MINIMAL}\n[[stories]]\ntag = \"story-a\"\nname = \"A\"\n\n[[stories]]\ntag = \"story-a\"\nname = \"Again\"\n"
        ));
    }

    #[test]
    fn story_tag_with_surrounding_whitespace_rejected() {
        assert_invalid(&format!(
            "{MINIMAL}\n[[stories]]\ntag = \" story-a\"\nname = \"A\"\n"
        ));
        assert_invalid(&format!(
            "{MINIMAL}\n[[stories]]\ntag = \"story-a \"\nname = \"A\"\n"
        ));
    }

    #[test]
    fn unknown_priority_tag_rejected() {
        let content = MINIMAL.replace(
            "end = \"2009-07-31\"",
            "end = \"2009-07-31\"\npriority = [\"story-missing\"]",
        );
        assert_invalid(&content);
    }

    #[test]
    fn missing_milestone_section_is_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Config::load(&write(dir.path(), "[branch]\nhead = \"main\"")).expect_err("parse");
        assert!(matches!(err, Error::TomlParse(_)));
    }
}
