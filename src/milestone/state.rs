//! Per-day status buckets for the work items of one milestone.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::days_inclusive;
use crate::error::{Error, Result};

/// Work item identifier (the bug number).
pub type ItemId = u64;

/// Lifecycle status recorded for an item on a given day.
///
/// Variants are ordered by progress: `Added < Started < Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Status {
    Added,
    Started,
    Done,
}

impl Status {
    /// One-character code used in rendered grids.
    pub fn code(self) -> char {
        match self {
            Status::Added => 'N',
            Status::Started => 'P',
            Status::Done => 'D',
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The tracked period of a milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Days after this are unknown future.
    pub today: NaiveDate,
    /// Unknown days after this are flagged as schedule risk.
    pub release_critical: NaiveDate,
}

impl Window {
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        today: NaiveDate,
        release_critical: NaiveDate,
    ) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidInput(format!(
                "milestone window start {start} is after end {end}"
            )));
        }
        Ok(Self {
            start,
            end,
            today,
            release_critical,
        })
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Clamp a day into `[start, end]`.
    pub fn clamp(&self, day: NaiveDate) -> NaiveDate {
        day.clamp(self.start, self.end)
    }
}

/// Aggregated milestone state: one bucket per window day.
///
/// Within one bucket the most advanced status wins, so the result does not
/// depend on the order in which tracker data and commit fixes are applied.
#[derive(Debug, Clone)]
pub struct MilestoneState {
    window: Window,
    days: BTreeMap<NaiveDate, HashMap<ItemId, Status>>,
}

impl MilestoneState {
    pub fn new(window: Window) -> Self {
        let days = days_inclusive(window.start, window.end)
            .map(|day| (day, HashMap::new()))
            .collect();
        Self { window, days }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Tracked days, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    /// Status recorded for `item` on exactly `day`, without carry-forward.
    pub fn recorded(&self, item: ItemId, day: NaiveDate) -> Option<Status> {
        self.days.get(&day)?.get(&item).copied()
    }

    /// Record that `item` was added on `day`.
    ///
    /// The caller resolves unknown dates (usually to the window start);
    /// a day outside the window is rejected.
    pub fn mark_added(&mut self, item: ItemId, day: NaiveDate) -> Result<()> {
        if !self.window.contains(day) {
            return Err(Error::InvalidInput(format!(
                "bug {item} added on {day}, outside milestone window {}..{}",
                self.window.start, self.window.end
            )));
        }
        self.record(item, day, Status::Added);
        Ok(())
    }

    /// Record that work on `item` started on `day`.
    ///
    /// Days without a bucket fold into the first day of the window.
    pub fn mark_started(&mut self, item: ItemId, day: NaiveDate) {
        let day = if self.days.contains_key(&day) {
            day
        } else {
            self.window.start
        };
        self.record(item, day, Status::Started);
    }

    /// Record that `item` was done on `day`.
    ///
    /// Early days clamp to the window start; days after the window end are
    /// ignored since that work does not belong to this milestone.
    pub fn mark_done(&mut self, item: ItemId, day: NaiveDate) {
        if day > self.window.end {
            tracing::debug!(item, %day, "done after milestone end; ignored");
            return;
        }
        let day = day.max(self.window.start);
        self.record(item, day, Status::Done);
    }

    fn record(&mut self, item: ItemId, day: NaiveDate, status: Status) {
        if let Some(bucket) = self.days.get_mut(&day) {
            let entry = bucket.entry(item).or_insert(status);
            if status > *entry {
                *entry = status;
            }
        }
    }
}
