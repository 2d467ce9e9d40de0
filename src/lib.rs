//! bugkit - Bug-Tracker Housekeeping Library
//!
//! This library provides the core functionality for the bugkit CLI tool.
//!
//! # Core Concepts
//!
//! - **Milestone window**: the tracked days of a milestone, with a "today"
//!   marker and a release-critical deadline
//! - **Day buckets**: per-day status (`N` added, `P` in progress, `D` done)
//!   for every work item
//! - **Stories**: work items grouped by `story-*` tags
//! - **Fix events**: bug ids claimed as fixed by commit messages
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Report configuration loading from `bugkit.toml`
//! - `error`: Error types and result aliases
//! - `dates`: Calendar date parsing
//! - `tracker`: Work items from the bug-tracker export
//! - `milestone`: Day buckets, stories and the progress grid
//! - `report`: The report pipeline and page writing
//! - `fixes`: Fixed bug ids in commit messages
//! - `git`: Repository discovery and the commit walk using libgit2
//! - `scan_state`: Persisted per-branch scan cursor
//! - `annotate`: Bug title annotation of free text
//! - `output`: Human and JSON output

pub mod annotate;
pub mod cli;
pub mod config;
pub mod dates;
pub mod error;
pub mod fixes;
pub mod git;
pub mod milestone;
pub mod output;
pub mod report;
pub mod scan_state;
pub mod tracker;

pub use error::{Error, Result};
