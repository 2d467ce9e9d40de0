//! Persisted fix-scan cursor: the last scanned commit per branch.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanState {
    /// Branch name -> id of the last commit already scanned.
    #[serde(default)]
    pub branches: BTreeMap<String, String>,
}

impl ScanState {
    /// Load the state file, or an empty state when it does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let state: ScanState = toml::from_str(&content)?;
        Ok(state)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn last_commit(&self, branch: &str) -> Option<&str> {
        self.branches.get(branch).map(String::as_str)
    }

    pub fn record(&mut self, branch: &str, commit: &str) -> Result<()> {
        if branch.trim().is_empty() {
            return Err(Error::InvalidArgument("branch name cannot be empty".to_string()));
        }
        self.branches.insert(branch.to_string(), commit.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = ScanState::load(&dir.path().join("scan.toml")).expect("load");
        assert_eq!(state, ScanState::default());
    }

    #[test]
    fn save_then_load_keeps_cursors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state").join("scan.toml");
        let mut state = ScanState::default();
        state.record("trunk", "abc123").expect("record");
        state.record("stable", "def456").expect("record");
        state.save(&path).expect("save");

        let loaded = ScanState::load(&path).expect("load");
        assert_eq!(loaded.last_commit("trunk"), Some("abc123"));
        assert_eq!(loaded.last_commit("stable"), Some("def456"));
        assert_eq!(loaded.last_commit("other"), None);
    }

    #[test]
    fn empty_branch_name_rejected() {
        let mut state = ScanState::default();
        assert!(matches!(
            state.record(" ", "abc"),
            Err(Error::InvalidArgument(_))
        ));
    }
}
