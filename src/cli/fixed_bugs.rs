//! bugkit fixed-bugs command implementation
//!
//! Lists commits whose messages fix bugs. With a scan cursor file the walk
//! resumes after the last commit seen for the branch and the cursor is moved
//! to the new tip.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::Result;
use crate::git::{self, CommitFix};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::scan_state::ScanState;

/// Options for the fixed-bugs command
pub struct FixedBugsOptions {
    pub since: Option<String>,
    pub head: String,
    pub state: Option<PathBuf>,
    pub branch: Option<String>,
    pub repo: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct FixedBugsReport {
    since: Option<String>,
    head: String,
    commits_scanned: usize,
    fixes: Vec<CommitFix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<String>,
}

pub fn run(options: FixedBugsOptions) -> Result<()> {
    let repository = git::discover_repo(options.repo.as_deref())?;

    let cursor = match (&options.state, &options.branch) {
        (Some(path), Some(branch)) => {
            Some((path.clone(), branch.clone(), ScanState::load(path)?))
        }
        _ => None,
    };

    let since = options.since.clone().or_else(|| {
        cursor
            .as_ref()
            .and_then(|(_, branch, state)| state.last_commit(branch).map(str::to_string))
    });

    let scan = git::scan_fixes(&repository, since.as_deref(), &options.head)?;

    let mut recorded = None;
    if let Some((path, branch, mut state)) = cursor {
        if let Some(last) = &scan.last_commit {
            state.record(&branch, last)?;
            state.save(&path)?;
            recorded = Some(last.clone());
            tracing::debug!(branch = %branch, commit = %last, "scan cursor moved");
        }
    }

    let range = match &since {
        Some(since) => format!("{since}..{}", options.head),
        None => options.head.clone(),
    };
    let mut human = HumanOutput::new("bugkit fixed-bugs");
    human.push_summary("range", range);
    human.push_summary("commits scanned", scan.commits_scanned.to_string());
    human.push_summary("fix commits", scan.fixes.len().to_string());
    for fix in &scan.fixes {
        let bugs: Vec<String> = fix.bugs.iter().map(|bug| bug.to_string()).collect();
        human.push_detail(format!(
            "{} {} fixes {}: {}",
            fix.commit.get(..8).unwrap_or(&fix.commit),
            fix.date,
            bugs.join(", "),
            fix.summary
        ));
    }
    if let Some(commit) = &recorded {
        human.push_next_step(format!(
            "next scan resumes after {}",
            commit.get(..8).unwrap_or(commit)
        ));
    }

    let data = FixedBugsReport {
        since,
        head: options.head,
        commits_scanned: scan.commits_scanned,
        fixes: scan.fixes,
        cursor: recorded,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "fixed-bugs",
        &data,
        Some(&human),
    )
}
