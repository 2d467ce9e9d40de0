//! Git repository discovery and the commit walk used to find bug fixes.

use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate};
use git2::{Commit, ErrorCode, Oid, Repository, Sort};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::fixes::fixed_bug_ids;
use crate::milestone::ItemId;

/// Discover a git repository from a starting path.
pub fn discover_repo(start: Option<&Path>) -> Result<Repository> {
    let start_path = match start {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()?,
    };

    Repository::discover(&start_path).map_err(|err| {
        if err.code() == ErrorCode::NotFound {
            Error::RepoNotFound(start_path)
        } else {
            Error::Git(err)
        }
    })
}

/// Resolve a revision (branch, tag, sha, `HEAD~2`) to a commit id.
pub fn resolve_commit(repo: &Repository, rev: &str) -> Result<Oid> {
    let object = repo.revparse_single(rev).map_err(|err| {
        if err.code() == ErrorCode::NotFound {
            Error::InvalidArgument(format!("revision '{rev}' does not exist"))
        } else {
            Error::Git(err)
        }
    })?;
    Ok(object.peel_to_commit()?.id())
}

/// Commits reachable from `head` but not from `since`, oldest first.
pub fn commits_since(repo: &Repository, since: Option<&str>, head: &str) -> Result<Vec<Oid>> {
    let head_oid = resolve_commit(repo, head)?;
    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)?;
    revwalk.push(head_oid)?;
    if let Some(since) = since {
        let since_oid = resolve_commit(repo, since)?;
        revwalk.hide(since_oid)?;
    }

    let mut commits = Vec::new();
    for oid in revwalk {
        commits.push(oid?);
    }
    Ok(commits)
}

/// Calendar day of a commit, in the commit's own UTC offset.
pub fn commit_date(commit: &Commit<'_>) -> Result<NaiveDate> {
    let time = commit.time();
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).ok_or_else(|| {
        Error::OperationFailed(format!(
            "commit {} has an invalid UTC offset of {} minutes",
            commit.id(),
            time.offset_minutes()
        ))
    })?;
    let utc = DateTime::from_timestamp(time.seconds(), 0).ok_or_else(|| {
        Error::OperationFailed(format!(
            "commit {} has an out of range timestamp {}",
            commit.id(),
            time.seconds()
        ))
    })?;
    Ok(utc.with_timezone(&offset).date_naive())
}

/// A commit that claims to fix bugs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitFix {
    pub commit: String,
    pub summary: String,
    pub date: NaiveDate,
    pub bugs: Vec<ItemId>,
}

/// Outcome of walking a commit range for fixes.
#[derive(Debug, Clone, Serialize)]
pub struct FixScan {
    /// Commits walked, including those without fixes.
    pub commits_scanned: usize,
    /// Last commit walked, if any.
    pub last_commit: Option<String>,
    pub fixes: Vec<CommitFix>,
}

/// Walk `since..head` and collect the commits whose messages fix bugs.
pub fn scan_fixes(repo: &Repository, since: Option<&str>, head: &str) -> Result<FixScan> {
    let commits = commits_since(repo, since, head)?;
    let mut fixes = Vec::new();
    for oid in &commits {
        let commit = repo.find_commit(*oid)?;
        let message = String::from_utf8_lossy(commit.message_bytes());
        let bugs = fixed_bug_ids(&message);
        if bugs.is_empty() {
            continue;
        }
        let fix = CommitFix {
            commit: oid.to_string(),
            summary: commit.summary().unwrap_or_default().to_string(),
            date: commit_date(&commit)?,
            bugs: bugs.into_iter().collect(),
        };
        tracing::debug!(commit = %fix.commit, bugs = ?fix.bugs, "commit fixes bugs");
        fixes.push(fix);
    }

    Ok(FixScan {
        commits_scanned: commits.len(),
        last_commit: commits.last().map(|oid| oid.to_string()),
        fixes,
    })
}
