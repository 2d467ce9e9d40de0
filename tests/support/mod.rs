#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use git2::{IndexAddOption, Oid, Repository, Signature, Time};
use tempfile::TempDir;

pub struct TestRepo {
    dir: TempDir,
    repo: Repository,
}

impl TestRepo {
    pub fn init() -> Result<Self, git2::Error> {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let repo = Repository::init(dir.path())?;
        set_identity(&repo)?;
        Ok(Self { dir, repo })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Commit everything in the worktree with the commit time set to noon
    /// UTC on `day` (YYYY-MM-DD).
    pub fn commit_on(&self, day: &str, message: &str) -> Result<Oid, git2::Error> {
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").expect("test date");
        let seconds = date
            .and_hms_opt(12, 0, 0)
            .expect("noon")
            .and_utc()
            .timestamp();
        self.commit_with_time(message, Time::new(seconds, 0))
    }

    /// Commit a file change on `day`.
    pub fn commit_change_on(
        &self,
        day: &str,
        rel_path: &str,
        contents: &str,
        message: &str,
    ) -> Result<Oid, Box<dyn std::error::Error>> {
        self.write_file(rel_path, contents)?;
        Ok(self.commit_on(day, message)?)
    }

    pub fn commit_with_time(&self, message: &str, time: Time) -> Result<Oid, git2::Error> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let sig = Signature::new("bugkit-test", "bugkit-test@example.com", &time)?;

        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.target())
            .and_then(|oid| self.repo.find_commit(oid).ok());

        let oid = match parent {
            Some(parent) => self
                .repo
                .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])?,
            None => self
                .repo
                .commit(Some("HEAD"), &sig, &sig, message, &tree, &[])?,
        };

        Ok(oid)
    }

    pub fn tag(&self, name: &str) -> Result<(), git2::Error> {
        let commit = self.repo.head()?.peel_to_commit()?;
        self.repo
            .tag_lightweight(name, commit.as_object(), false)?;
        Ok(())
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }
}

fn set_identity(repo: &Repository) -> Result<(), git2::Error> {
    let mut cfg = repo.config()?;
    cfg.set_str("user.name", "bugkit-test")?;
    cfg.set_str("user.email", "bugkit-test@example.com")?;
    Ok(())
}

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Write a report config into `dir` and return its path.
pub fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("bugkit.toml");
    fs::write(&path, content.trim_start()).expect("write config");
    path
}

/// Write a tracker export into `dir` and return its path.
pub fn write_items(dir: &Path, json: &str) -> PathBuf {
    let path = dir.join("bugs.json");
    fs::write(&path, json).expect("write items");
    path
}
