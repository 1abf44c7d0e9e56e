/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Interval tables: the repeating schedule of a table-driven reservation.
//!
//! A table is a list of [`Interval`]s expressed as offsets from the start of a
//! major cycle.  The table is validated once at construction and never changes
//! afterwards; reservations share it through an `Arc`.
//!
//! ```text
//!  major cycle k                          major cycle k+1
//!  |<──────────────── major_cycle ─────────>|<──────────── ...
//!  [ slot 0 ]     [ slot 1 ]                [ slot 0 ]     [ slot 1 ]
//!  0        100   200      300          500 500      600   700      800
//! ```

pub mod cycle;

use thiserror::Error;

/// Absolute or relative time, in the environment's time unit (typically ns).
pub type Time = u64;

// ── Error type ────────────────────────────────────────────────────────────────

/// Reasons an interval table configuration is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// The interval list was empty.
    #[error("interval table is empty; at least one slot is required")]
    EmptyTable,

    /// `major_cycle` was zero.
    #[error("major cycle must be a positive number of time units")]
    ZeroMajorCycle,

    /// An interval with `start >= end`.
    #[error("interval #{index} [{start}, {end}) is empty or reversed")]
    EmptyInterval { index: usize, start: Time, end: Time },

    /// An interval extending past the end of the major cycle.
    #[error("interval #{index} ends at {end}, past the major cycle of {major_cycle}")]
    OutOfRange {
        index: usize,
        end: Time,
        major_cycle: Time,
    },

    /// An interval that starts before its predecessor ends (also catches
    /// unordered tables).
    #[error("interval #{index} starts at {start} before interval #{prev} ends at {prev_end}")]
    Overlap {
        index: usize,
        start: Time,
        prev: usize,
        prev_end: Time,
    },
}

// ── Interval ──────────────────────────────────────────────────────────────────

/// A half-open time window `[start, end)`.
///
/// Inside a table the bounds are offsets into the major cycle; once a slot is
/// activated the reservation keeps the absolute version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interval {
    pub start: Time,
    pub end: Time,
}

impl Interval {
    pub const fn new(start: Time, end: Time) -> Self {
        Self { start, end }
    }

    /// Length of the window.
    pub fn duration(&self) -> Time {
        self.end.saturating_sub(self.start)
    }

    /// The same window shifted forward by `base`.
    pub fn offset_by(&self, base: Time) -> Self {
        Self {
            start: base + self.start,
            end: base + self.end,
        }
    }

}

impl From<(Time, Time)> for Interval {
    fn from((start, end): (Time, Time)) -> Self {
        Self { start, end }
    }
}

// ── IntervalTable ─────────────────────────────────────────────────────────────

/// Validated, immutable slot table for one reservation.
///
/// # Invariants
/// * `major_cycle > 0` and at least one interval.
/// * Every interval satisfies `start < end <= major_cycle`.
/// * Intervals are sorted and pairwise non-overlapping (`prev.end <= next.start`;
///   back-to-back slots are allowed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTable {
    major_cycle: Time,
    intervals: Vec<Interval>,
}

impl IntervalTable {
    /// Validate `intervals` against `major_cycle` and build the table.
    ///
    /// # Errors
    /// Returns the first [`TableError`] found, scanning in table order.
    pub fn new(major_cycle: Time, intervals: Vec<Interval>) -> Result<Self, TableError> {
        if major_cycle == 0 {
            return Err(TableError::ZeroMajorCycle);
        }
        if intervals.is_empty() {
            return Err(TableError::EmptyTable);
        }

        for (index, iv) in intervals.iter().enumerate() {
            if iv.start >= iv.end {
                return Err(TableError::EmptyInterval {
                    index,
                    start: iv.start,
                    end: iv.end,
                });
            }
            if iv.end > major_cycle {
                return Err(TableError::OutOfRange {
                    index,
                    end: iv.end,
                    major_cycle,
                });
            }
            if index > 0 {
                let prev = &intervals[index - 1];
                if iv.start < prev.end {
                    return Err(TableError::Overlap {
                        index,
                        start: iv.start,
                        prev: index - 1,
                        prev_end: prev.end,
                    });
                }
            }
        }

        Ok(Self {
            major_cycle,
            intervals,
        })
    }

    pub fn major_cycle(&self) -> Time {
        self.major_cycle
    }

    /// Number of slots per major cycle (always ≥ 1).
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Always `false`; kept so `len` has its usual companion.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Slot `index` as cycle-relative offsets.
    ///
    /// # Panics
    /// If `index >= len()`.
    pub fn slot(&self, index: usize) -> Interval {
        self.intervals[index]
    }

    /// Sum of all slot lengths in one major cycle.
    pub fn allocated_per_cycle(&self) -> Time {
        self.intervals.iter().map(Interval::duration).sum()
    }

    /// Fraction of the major cycle covered by slots.
    pub fn utilization(&self) -> f64 {
        self.allocated_per_cycle() as f64 / self.major_cycle as f64
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
