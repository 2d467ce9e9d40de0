//! Progress grid: the per-story, per-day view of a milestone and its
//! renderings.
//!
//! Building the grid applies the display rules (carry-forward of the last
//! known status, blank future, risk highlight after the release-critical
//! date); rendering only decides markup.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::state::{ItemId, MilestoneState, Status};
use super::story::Story;

/// One (item, day) cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    /// No status recorded yet on or before this day.
    Unknown,
    /// Last status recorded on or before this day.
    Known(Status),
    /// After today.
    Future,
    /// After today and after the release-critical date.
    AtRisk,
}

impl Cell {
    pub fn status(self) -> Option<Status> {
        match self {
            Cell::Known(status) => Some(status),
            _ => None,
        }
    }
}

/// A story's "status so far" for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryCell {
    Tally { done: usize, total: usize },
    Future,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemRow {
    pub id: ItemId,
    pub title: String,
    pub assignee: Option<String>,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorySection {
    pub tag: String,
    pub name: String,
    pub anchor: String,
    pub unrelated: bool,
    pub summary: Vec<SummaryCell>,
    pub rows: Vec<ItemRow>,
}

/// The whole grid, columns are `days`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressGrid {
    pub days: Vec<NaiveDate>,
    pub sections: Vec<StorySection>,
}

impl ProgressGrid {
    /// Build the grid for `stories`, in the order given.
    pub fn build<'a>(
        state: &MilestoneState,
        stories: impl IntoIterator<Item = &'a Story>,
    ) -> Self {
        let days: Vec<NaiveDate> = state.days().collect();
        let sections = stories
            .into_iter()
            .map(|story| build_section(state, &days, story))
            .collect();
        Self { days, sections }
    }
}

fn build_section(state: &MilestoneState, days: &[NaiveDate], story: &Story) -> StorySection {
    let rows: Vec<ItemRow> = story
        .items
        .iter()
        .map(|item| ItemRow {
            id: item.id,
            title: item.display_title().to_string(),
            assignee: item.assignee.clone(),
            cells: item_cells(state, item.id),
        })
        .collect();

    let summary = days
        .iter()
        .enumerate()
        .map(|(column, day)| {
            if *day > state.window().today {
                return SummaryCell::Future;
            }
            let done = rows
                .iter()
                .filter(|row| row.cells[column] == Cell::Known(Status::Done))
                .count();
            SummaryCell::Tally {
                done,
                total: rows.len(),
            }
        })
        .collect();

    StorySection {
        tag: story.tag.clone(),
        name: story.name.clone(),
        anchor: story.anchor().to_string(),
        unrelated: story.is_unrelated(),
        summary,
        rows,
    }
}

/// Cells for one item across the window.
pub fn item_cells(state: &MilestoneState, item: ItemId) -> Vec<Cell> {
    let window = *state.window();
    let mut current = None;
    state
        .days()
        .map(|day| {
            if day > window.today {
                return if day > window.release_critical {
                    Cell::AtRisk
                } else {
                    Cell::Future
                };
            }
            if let Some(status) = state.recorded(item, day) {
                current = Some(status);
            }
            match current {
                Some(status) => Cell::Known(status),
                None => Cell::Unknown,
            }
        })
        .collect()
}

/// Output markup for a rendered grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridFormat {
    /// MoinMoin wiki table markup.
    #[default]
    Moin,
    /// Fixed-width plain text.
    Text,
}

impl std::str::FromStr for GridFormat {
    type Err = crate::error::Error;

    fn from_str(value: &str) -> crate::error::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "moin" => Ok(GridFormat::Moin),
            "text" => Ok(GridFormat::Text),
            other => Err(crate::error::Error::InvalidArgument(format!(
                "unknown format '{other}' (expected moin|text)"
            ))),
        }
    }
}

/// Link targets used by the wiki rendering.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Prefix for bug links; the bug id is appended.
    pub bug_url: String,
    /// Wiki page holding one anchor per story.
    pub stories_page: String,
}

impl GridFormat {
    pub fn render(self, grid: &ProgressGrid, options: &RenderOptions) -> String {
        match self {
            GridFormat::Moin => render_moin(grid, options),
            GridFormat::Text => render_text(grid),
        }
    }
}

const STORY_ROW_COLOR: &str = "#E0E0FF";
const UNRELATED_ROW_COLOR: &str = "#CC6633";
const AT_RISK_COLOR: &str = "#C8BBBE";

fn status_color(status: Status) -> &'static str {
    match status {
        Status::Added => "#FFFFE0",
        Status::Started => "#FF8080",
        Status::Done => "#80FF80",
    }
}

fn moin_cell(cell: Cell) -> String {
    match cell {
        Cell::Known(status) => format!(
            "<style=\"background-color: {};\"> {}",
            status_color(status),
            status
        ),
        Cell::AtRisk => format!("<style=\"background-color: {AT_RISK_COLOR};\"> "),
        Cell::Unknown | Cell::Future => " ".to_string(),
    }
}

/// Render as a MoinMoin table.
pub fn render_moin(grid: &ProgressGrid, options: &RenderOptions) -> String {
    let mut lines = Vec::new();

    let mut titles = vec!["''Story/Task''".to_string(), "''Assignee''".to_string()];
    titles.extend(grid.days.iter().map(|day| format!("''{}''", day.day())));
    lines.push(format!("|| {} ||", titles.join(" || ")));

    for section in &grid.sections {
        let title = if section.unrelated {
            format!("<rowstyle=\"background-color: {UNRELATED_ROW_COLOR};\"> {}", section.name)
        } else {
            format!(
                "<rowstyle=\"background-color: {STORY_ROW_COLOR};\"> '''[[{}#{}|{}]]'''",
                options.stories_page, section.anchor, section.name
            )
        };
        let mut header = vec![title, String::new()];
        header.extend(grid.days.iter().map(|_| String::new()));
        lines.push(format!("||{} ||", header.join(" ||")));

        let mut summary = vec!["''so far''".to_string(), String::new()];
        summary.extend(section.summary.iter().map(|cell| match cell {
            SummaryCell::Tally { done, total } => format!("{done}/{total}"),
            SummaryCell::Future => String::new(),
        }));
        lines.push(format!("|| {} ||", summary.join(" || ")));

        for row in &section.rows {
            let mut items = vec![format!(
                "[[{url}{id}|#{id}]]: {title}",
                url = options.bug_url,
                id = row.id,
                title = row.title
            )];
            items.push(match &row.assignee {
                Some(name) => format!(" [[/{name}|{name}]] "),
                None => String::new(),
            });
            items.extend(row.cells.iter().map(|cell| moin_cell(*cell)));
            lines.push(format!("|| {} ||", items.join(" ||")));
        }
    }

    lines.join("\n")
}

fn text_cell(cell: Cell) -> char {
    match cell {
        Cell::Known(status) => status.code(),
        Cell::Unknown => ' ',
        Cell::Future => '.',
        Cell::AtRisk => '!',
    }
}

/// Render as fixed-width text for terminals.
pub fn render_text(grid: &ProgressGrid) -> String {
    let label_width = grid
        .sections
        .iter()
        .flat_map(|section| {
            std::iter::once(section.name.chars().count()).chain(
                section
                    .rows
                    .iter()
                    .map(|row| format!("  #{} {}", row.id, row.title).chars().count()),
            )
        })
        .chain(std::iter::once("Story/Task".len()))
        .max()
        .unwrap_or(0);
    let assignee_width = grid
        .sections
        .iter()
        .flat_map(|section| section.rows.iter())
        .filter_map(|row| row.assignee.as_ref().map(|name| name.chars().count()))
        .chain(std::iter::once("Assignee".len()))
        .max()
        .unwrap_or(0);

    let mut lines = Vec::new();
    let days: Vec<String> = grid.days.iter().map(|day| format!("{:>2}", day.day())).collect();
    lines.push(format!(
        "{:<label_width$}  {:<assignee_width$}  {}",
        "Story/Task",
        "Assignee",
        days.join(" ")
    ));

    for section in &grid.sections {
        lines.push(String::new());
        lines.push(section.name.clone());
        let summary: Vec<String> = section
            .summary
            .iter()
            .map(|cell| match cell {
                SummaryCell::Tally { done, .. } => format!("{done:>2}"),
                SummaryCell::Future => " .".to_string(),
            })
            .collect();
        let total = section.rows.len();
        lines.push(format!(
            "{:<label_width$}  {:<assignee_width$}  {}",
            format!("  done of {total}"),
            "",
            summary.join(" ")
        ));
        for row in &section.rows {
            let cells: Vec<String> = row
                .cells
                .iter()
                .map(|cell| format!("{:>2}", text_cell(*cell)))
                .collect();
            lines.push(format!(
                "{:<label_width$}  {:<assignee_width$}  {}",
                format!("  #{} {}", row.id, row.title),
                row.assignee.as_deref().unwrap_or(""),
                cells.join(" ")
            ));
        }
    }

    lines
        .iter()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milestone::state::Window;
    use crate::milestone::story::StoryBook;
    use crate::tracker::WorkItem;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2009, 7, n).expect("valid date")
    }

    fn state() -> MilestoneState {
        let window = Window::new(day(1), day(5), day(3), day(4)).expect("window");
        MilestoneState::new(window)
    }

    fn options() -> RenderOptions {
        RenderOptions {
            bug_url: "https://bugs.example.net/".to_string(),
            stories_page: "Stories".to_string(),
        }
    }

    #[test]
    fn status_carries_forward_until_today() {
        let mut state = state();
        state.mark_added(1, day(1)).unwrap();
        state.mark_started(1, day(2));
        state.mark_done(1, day(10));
        assert_eq!(
            item_cells(&state, 1),
            vec![
                Cell::Known(Status::Added),
                Cell::Known(Status::Started),
                Cell::Known(Status::Started),
                Cell::Future,
                Cell::AtRisk,
            ]
        );
    }

    #[test]
    fn later_mark_overrides_carried_status() {
        let mut state = state();
        state.mark_added(1, day(1)).unwrap();
        state.mark_done(1, day(2));
        state.mark_started(1, day(3));
        let statuses: Vec<_> = item_cells(&state, 1).into_iter().map(Cell::status).collect();
        assert_eq!(
            statuses,
            vec![
                Some(Status::Added),
                Some(Status::Done),
                Some(Status::Started),
                None,
                None
            ]
        );
    }

    #[test]
    fn unmarked_item_is_unknown_until_future() {
        let state = state();
        assert_eq!(
            item_cells(&state, 77),
            vec![
                Cell::Unknown,
                Cell::Unknown,
                Cell::Unknown,
                Cell::Future,
                Cell::AtRisk
            ]
        );
    }

    #[test]
    fn summary_counts_done_items_up_to_today() {
        let mut state = state();
        let mut book = StoryBook::new([("story-api", "API")]);
        for id in [1, 2] {
            let mut item = WorkItem::new(id, format!("bug {id}"));
            item.tags = vec!["story-api".to_string()];
            book.assign(&item);
            state.mark_added(id, day(1)).unwrap();
        }
        state.mark_done(1, day(2));

        let stories = book.ordered(&["story-api".to_string()]).unwrap();
        let grid = ProgressGrid::build(&state, stories.into_iter().take(1));
        assert_eq!(
            grid.sections[0].summary,
            vec![
                SummaryCell::Tally { done: 0, total: 2 },
                SummaryCell::Tally { done: 1, total: 2 },
                SummaryCell::Tally { done: 1, total: 2 },
                SummaryCell::Future,
                SummaryCell::Future,
            ]
        );
    }

    #[test]
    fn moin_rendering_matches_wiki_markup() {
        let mut state = state();
        let mut book = StoryBook::new([("story-login", "Log in")]);
        let mut item = WorkItem::new(42, "Crash on start");
        item.tags = vec!["story-login".to_string()];
        item.assignee = Some("alice".to_string());
        book.assign(&item);
        book.assign(&WorkItem::new(7, "Typo"));
        state.mark_added(42, day(1)).unwrap();
        state.mark_done(42, day(2));
        state.mark_added(7, day(1)).unwrap();

        let stories = book.ordered(&["story-login".to_string()]).unwrap();
        let grid = ProgressGrid::build(&state, stories);
        let table = render_moin(&grid, &options());
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(
            lines[0],
            "|| ''Story/Task'' || ''Assignee'' || ''1'' || ''2'' || ''3'' || ''4'' || ''5'' ||"
        );
        assert_eq!(
            lines[1],
            "||<rowstyle=\"background-color: #E0E0FF;\"> '''[[Stories#login|Log in]]''' || || || || || || ||"
        );
        assert_eq!(lines[2], "|| ''so far'' ||  || 0/1 || 1/1 || 1/1 ||  ||  ||");
        assert_eq!(
            lines[3],
            "|| [[https://bugs.example.net/42|#42]]: Crash on start || [[/alice|alice]]  ||\
             <style=\"background-color: #FFFFE0;\"> N ||\
             <style=\"background-color: #80FF80;\"> D ||\
             <style=\"background-color: #80FF80;\"> D ||  ||\
             <style=\"background-color: #C8BBBE;\">  ||"
        );
        assert!(lines[4].starts_with("||<rowstyle=\"background-color: #CC6633;\"> Bugs not related to a story"));
        assert!(lines[6].starts_with("|| [[https://bugs.example.net/7|#7]]: Typo ||"));
    }

    #[test]
    fn text_rendering_uses_status_codes() {
        let mut state = state();
        let mut book = StoryBook::new(std::iter::empty());
        book.assign(&WorkItem::new(3, "Slow query"));
        state.mark_added(3, day(1)).unwrap();
        state.mark_started(3, day(3));

        let stories = book.ordered(&[]).unwrap();
        let grid = ProgressGrid::build(&state, stories);
        let table = render_text(&grid);
        assert!(table.contains("Story/Task"));
        assert!(table.contains("Bugs not related to a story"));
        let row = table
            .lines()
            .find(|line| line.contains("#3 Slow query"))
            .expect("item row");
        assert!(row.ends_with(" N  N  P  .  !"), "row was {row:?}");
    }

    #[test]
    fn grid_format_parses_names() {
        assert_eq!("moin".parse::<GridFormat>().unwrap(), GridFormat::Moin);
        assert_eq!("TEXT".parse::<GridFormat>().unwrap(), GridFormat::Text);
        assert!("html".parse::<GridFormat>().is_err());
    }
}
