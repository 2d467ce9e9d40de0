//! Milestone progress report pipeline.
//!
//! Feeds tracker state and commit fixes into a [`MilestoneState`], renders
//! the main page and one page per assignee, and writes pages that changed.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::git::CommitFix;
use crate::milestone::{
    GridFormat, ItemId, MilestoneState, ProgressGrid, RenderOptions, StoryBook, Window,
};
use crate::tracker::WorkItem;

/// Template used when the configuration names none.
pub const DEFAULT_TEMPLATE: &str = "= Milestone {milestone} =\n\n{progress_table}\n";

/// Everything a report run needs, passed explicitly.
pub struct ReportInput<'a> {
    pub config: &'a Config,
    pub items: &'a [WorkItem],
    pub fixes: &'a [CommitFix],
    pub today: NaiveDate,
    pub format: GridFormat,
}

/// A fix event applied to a milestone item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedFix {
    pub bug: ItemId,
    pub date: NaiveDate,
    pub commit: String,
}

/// A rendered page, addressed relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub path: PathBuf,
    #[serde(skip)]
    pub content: String,
}

/// Result of aggregating and rendering a milestone.
#[derive(Debug)]
pub struct Report {
    pub state: MilestoneState,
    pub stories: StoryBook,
    pub assignees: BTreeSet<String>,
    pub applied_fixes: Vec<AppliedFix>,
    pub ignored_fix_bugs: BTreeSet<ItemId>,
    pub main: Page,
    pub assignee_pages: Vec<Page>,
}

impl Report {
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        std::iter::once(&self.main).chain(self.assignee_pages.iter())
    }
}

/// Milestone state and stories before rendering.
#[derive(Debug)]
pub struct Aggregate {
    pub state: MilestoneState,
    pub stories: StoryBook,
    pub applied_fixes: Vec<AppliedFix>,
    /// Bugs named by fix commits that are not milestone items.
    pub ignored_fix_bugs: BTreeSet<ItemId>,
}

/// Aggregate the milestone state from tracker items and commit fixes.
///
/// Tracker dates are applied first, then every commit fix for a milestone
/// item. Fixes for bugs outside the milestone are reported as ignored.
pub fn aggregate(
    config: &Config,
    items: &[WorkItem],
    fixes: &[CommitFix],
    today: NaiveDate,
) -> Result<Aggregate> {
    let window = config.milestone.dates()?.window(today)?;
    let mut state = MilestoneState::new(window);
    let mut stories = StoryBook::new(config.story_names());

    let mut first_fix: HashMap<ItemId, NaiveDate> = HashMap::new();
    for fix in fixes {
        for bug in &fix.bugs {
            first_fix
                .entry(*bug)
                .and_modify(|day| *day = (*day).min(fix.date))
                .or_insert(fix.date);
        }
    }

    for item in items {
        stories.assign(item);
        let added = added_day(&window, item, first_fix.get(&item.id).copied());
        state.mark_added(item.id, added)?;
        if let Some(started) = item.started {
            state.mark_started(item.id, started);
        }
        if let Some(done) = item.done {
            state.mark_done(item.id, done);
        }
    }

    let milestone_ids: HashSet<ItemId> = items.iter().map(|item| item.id).collect();
    let mut applied = Vec::new();
    let mut ignored = BTreeSet::new();
    for fix in fixes {
        for bug in &fix.bugs {
            if milestone_ids.contains(bug) {
                state.mark_done(*bug, fix.date);
                applied.push(AppliedFix {
                    bug: *bug,
                    date: fix.date,
                    commit: fix.commit.clone(),
                });
            } else {
                tracing::debug!(bug, commit = %fix.commit, "fixed bug is not in the milestone");
                ignored.insert(*bug);
            }
        }
    }

    Ok(Aggregate {
        state,
        stories,
        applied_fixes: applied,
        ignored_fix_bugs: ignored,
    })
}

/// Day an item enters the window.
///
/// The created date clamped into the window, moved back to the first day
/// the item is started or done so no later `N` follows its progress.
fn added_day(window: &Window, item: &WorkItem, first_fix: Option<NaiveDate>) -> NaiveDate {
    let mut added = item
        .added
        .map(|day| window.clamp(day))
        .unwrap_or(window.start);
    if let Some(started) = item.started {
        let started = if window.contains(started) {
            started
        } else {
            window.start
        };
        added = added.min(started);
    }
    for done in item.done.into_iter().chain(first_fix) {
        if done <= window.end {
            added = added.min(done.max(window.start));
        }
    }
    added
}

/// Substitute `{milestone}` and `{progress_table}` in a page template.
pub fn fill_template(template: &str, milestone: &str, table: &str) -> String {
    template
        .replace("{milestone}", milestone)
        .replace("{progress_table}", table)
}

/// Aggregate and render every page of the report.
pub fn build(input: ReportInput<'_>, template: &str) -> Result<Report> {
    let config = input.config;
    let Aggregate {
        state,
        stories,
        applied_fixes,
        ignored_fix_bugs,
    } = aggregate(config, input.items, input.fixes, input.today)?;

    let priority = config.priority_order();
    let options = RenderOptions {
        bug_url: config.milestone.bug_url.clone(),
        stories_page: config.milestone.stories_page.clone(),
    };
    let milestone = config.milestone.name.as_str();

    let grid = ProgressGrid::build(&state, stories.ordered(&priority)?);
    let table = input.format.render(&grid, &options);
    let main = Page {
        path: PathBuf::from(format!("{milestone}.txt")),
        content: fill_template(template, milestone, &table),
    };

    let assignees: BTreeSet<String> = input
        .items
        .iter()
        .filter_map(|item| item.assignee.clone())
        .collect();

    let mut assignee_pages = Vec::with_capacity(assignees.len());
    for assignee in &assignees {
        let subset = stories.for_assignee(assignee, &priority)?;
        let grid = ProgressGrid::build(&state, subset.iter());
        assignee_pages.push(Page {
            path: Path::new(milestone).join(format!("{}.txt", page_name(assignee))),
            content: input.format.render(&grid, &options),
        });
    }

    tracing::info!(
        milestone,
        items = input.items.len(),
        fixes = applied_fixes.len(),
        assignees = assignees.len(),
        "milestone report rendered"
    );

    Ok(Report {
        state,
        stories,
        assignees,
        applied_fixes,
        ignored_fix_bugs,
        main,
        assignee_pages,
    })
}

fn page_name(assignee: &str) -> String {
    assignee
        .chars()
        .map(|ch| if ch == '/' || ch == '\\' { '_' } else { ch })
        .collect()
}

/// Whether a page was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Write `page` under `output_dir` unless the file already has this content.
pub fn write_if_changed(output_dir: &Path, page: &Page) -> Result<WriteOutcome> {
    let path = output_dir.join(&page.path);
    if let Ok(existing) = std::fs::read_to_string(&path) {
        if existing == page.content {
            tracing::debug!(path = %path.display(), "page unchanged");
            return Ok(WriteOutcome::Unchanged);
        }
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, &page.content)?;
    tracing::debug!(path = %path.display(), "page written");
    Ok(WriteOutcome::Written)
}
