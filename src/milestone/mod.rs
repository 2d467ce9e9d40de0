//! Milestone progress aggregation.
//!
//! - `state`: per-day status buckets over the milestone window
//! - `story`: grouping of work items into stories
//! - `table`: the progress grid and its wiki/text renderings

pub mod state;
pub mod story;
pub mod table;

pub use state::{ItemId, MilestoneState, Status, Window};
pub use story::{Story, StoryBook, UNRELATED_NAME, UNRELATED_TAG};
pub use table::{Cell, GridFormat, ProgressGrid, RenderOptions, SummaryCell};
