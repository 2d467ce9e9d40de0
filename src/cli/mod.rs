//! Command-line interface for bugkit
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::Result;

mod annotate;
mod fixed_bugs;
mod progress;

/// bugkit - bug-tracker housekeeping
///
/// Milestone progress reports built from tracker exports and commit history,
/// fixed-bug scanning of commit messages, and bug title annotation.
#[derive(Parser, Debug)]
#[command(name = "bugkit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the git repository (defaults to current directory)
    #[arg(long, global = true, env = "BUGKIT_REPO")]
    pub repo: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the milestone progress report
    Progress {
        /// Report configuration file
        #[arg(short, long, default_value = crate::config::CONFIG_FILE)]
        config: PathBuf,

        /// Tracker export (JSON array of bug tasks)
        #[arg(short, long)]
        items: PathBuf,

        /// Day treated as today (YYYY-MM-DD, defaults to the local date)
        #[arg(long)]
        today: Option<String>,

        /// Directory for rendered pages (overrides the config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Table markup: moin or text (overrides the config)
        #[arg(long)]
        format: Option<String>,

        /// Print the main page instead of writing pages
        #[arg(long)]
        stdout: bool,

        /// Skip scanning commits for fixes
        #[arg(long)]
        no_commits: bool,
    },

    /// List commits that fix bugs according to their messages
    FixedBugs {
        /// Only scan commits not reachable from this revision
        #[arg(long)]
        since: Option<String>,

        /// Tip of the scanned range
        #[arg(long, default_value = "HEAD")]
        head: String,

        /// Scan cursor file; resumes after the last scanned commit
        #[arg(long, requires = "branch")]
        state: Option<PathBuf>,

        /// Branch name used as the key in the scan cursor file
        #[arg(long, requires = "state")]
        branch: Option<String>,
    },

    /// Append bug titles after bug references in text
    Annotate {
        /// Bug titles: JSON map of id to title, or a tracker export
        #[arg(short, long)]
        titles: PathBuf,

        /// Input text file (defaults to stdin)
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Progress {
                config,
                items,
                today,
                output_dir,
                format,
                stdout,
                no_commits,
            } => progress::run(progress::ProgressOptions {
                config,
                items,
                today,
                output_dir,
                format,
                stdout,
                no_commits,
                repo: self.repo,
                json: self.json,
                quiet: self.quiet,
                verbose: self.verbose,
            }),
            Commands::FixedBugs {
                since,
                head,
                state,
                branch,
            } => fixed_bugs::run(fixed_bugs::FixedBugsOptions {
                since,
                head,
                state,
                branch,
                repo: self.repo,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Annotate { titles, input } => annotate::run(annotate::AnnotateOptions {
                titles,
                input,
                json: self.json,
                quiet: self.quiet,
            }),
        }
    }
}
