//! bugkit progress command implementation
//!
//! Aggregates a milestone from a tracker export and the configured branch,
//! then writes the main page and one page per assignee.

use std::path::PathBuf;

use chrono::Local;
use serde::Serialize;

use crate::config::Config;
use crate::dates::parse_iso_date;
use crate::error::{Error, Result};
use crate::git::{self, CommitFix};
use crate::milestone::{GridFormat, ItemId, Window};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::report::{self, AppliedFix, ReportInput, WriteOutcome, DEFAULT_TEMPLATE};
use crate::tracker::load_items;

/// Options for the progress command
pub struct ProgressOptions {
    pub config: PathBuf,
    pub items: PathBuf,
    pub today: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub format: Option<String>,
    pub stdout: bool,
    pub no_commits: bool,
    pub repo: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
    pub verbose: bool,
}

#[derive(Serialize)]
struct ProgressReport {
    milestone: String,
    window: Window,
    items: usize,
    stories: usize,
    assignees: Vec<String>,
    commits_scanned: usize,
    fixes_applied: Vec<AppliedFix>,
    ignored_fix_bugs: Vec<ItemId>,
    pages: Vec<PageResult>,
}

#[derive(Serialize)]
struct PageResult {
    path: PathBuf,
    outcome: WriteOutcome,
}

pub fn run(options: ProgressOptions) -> Result<()> {
    let config = Config::load(&options.config)?;
    let items = load_items(&options.items)?;
    let today = match options.today.as_deref() {
        Some(value) => parse_iso_date(value)
            .map_err(|err| Error::InvalidArgument(format!("--today: {err}")))?,
        None => Local::now().date_naive(),
    };
    let format = match options.format.as_deref() {
        Some(value) => value.parse::<GridFormat>()?,
        None => config.milestone.format,
    };

    let (commits_scanned, fixes) = if options.no_commits {
        (0, Vec::new())
    } else {
        scan_branch(&config, options.repo.as_ref())?
    };

    let template = match &config.milestone.template {
        Some(path) => std::fs::read_to_string(config.resolve_path(path))?,
        None => DEFAULT_TEMPLATE.to_string(),
    };

    let report = report::build(
        ReportInput {
            config: &config,
            items: &items,
            fixes: &fixes,
            today,
            format,
        },
        &template,
    )?;

    if options.stdout {
        print!("{}", report.main.content);
        return Ok(());
    }

    let output_dir = match options.output_dir {
        Some(dir) => dir,
        None => config.resolve_path(&config.milestone.output_dir),
    };
    let mut pages = Vec::new();
    for page in report.pages() {
        let outcome = report::write_if_changed(&output_dir, page)?;
        pages.push(PageResult {
            path: output_dir.join(&page.path),
            outcome,
        });
    }

    let written = pages
        .iter()
        .filter(|page| page.outcome == WriteOutcome::Written)
        .count();
    let window = *report.state.window();

    let mut human = HumanOutput::new(format!(
        "bugkit progress: milestone {}",
        config.milestone.name
    ));
    human.push_summary(
        "window",
        format!("{} .. {} (today {})", window.start, window.end, window.today),
    );
    human.push_summary("items", items.len().to_string());
    human.push_summary("stories", report.stories.len().to_string());
    human.push_summary("commits scanned", commits_scanned.to_string());
    human.push_summary("fixes applied", report.applied_fixes.len().to_string());
    human.push_summary(
        "pages",
        format!("{written} written, {} unchanged", pages.len() - written),
    );
    if options.verbose {
        for page in &pages {
            let label = match page.outcome {
                WriteOutcome::Written => "written",
                WriteOutcome::Unchanged => "unchanged",
            };
            human.push_detail(format!("{label}: {}", page.path.display()));
        }
        for fix in &report.applied_fixes {
            human.push_detail(format!(
                "bug {} done {} ({})",
                fix.bug,
                fix.date,
                short(&fix.commit)
            ));
        }
    }
    if !report.ignored_fix_bugs.is_empty() {
        let ids: Vec<String> = report
            .ignored_fix_bugs
            .iter()
            .map(|id| id.to_string())
            .collect();
        human.push_warning(format!(
            "fixed bugs not in milestone {}: {}",
            config.milestone.name,
            ids.join(", ")
        ));
    }
    if window.today > window.end {
        human.push_warning(format!("milestone ended on {}", window.end));
    }

    let data = ProgressReport {
        milestone: config.milestone.name.clone(),
        window,
        items: items.len(),
        stories: report.stories.len(),
        assignees: report.assignees.iter().cloned().collect(),
        commits_scanned,
        fixes_applied: report.applied_fixes.clone(),
        ignored_fix_bugs: report.ignored_fix_bugs.iter().copied().collect(),
        pages,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "progress",
        &data,
        Some(&human),
    )
}

fn scan_branch(config: &Config, repo: Option<&PathBuf>) -> Result<(usize, Vec<CommitFix>)> {
    let Some(branch) = &config.branch else {
        return Ok((0, Vec::new()));
    };
    let location = match repo {
        Some(path) => path.clone(),
        None => config.resolve_path(&branch.location),
    };
    let repository = git::discover_repo(Some(location.as_path()))?;
    let scan = git::scan_fixes(&repository, branch.start_ref.as_deref(), &branch.head)?;
    tracing::info!(
        commits = scan.commits_scanned,
        fixes = scan.fixes.len(),
        "scanned branch for fixes"
    );
    Ok((scan.commits_scanned, scan.fixes))
}

fn short(commit: &str) -> &str {
    commit.get(..8).unwrap_or(commit)
}
