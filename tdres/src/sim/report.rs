/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Simulation results.

use serde::Serialize;

use crate::reservation::{ReservationId, ReservationState, TaskClass};
use crate::table::Time;

/// A contiguous stretch of execution of one task on behalf of one reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub start: Time,
    pub end: Time,
    /// Reservation whose budget paid for the segment.
    pub reservation: u32,
    pub task: String,
    pub client: u32,
}

impl Segment {
    pub fn duration(&self) -> Time {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub name: String,
    pub client: u32,
    pub class: TaskClass,
    pub reservation: u32,
    pub executed: Time,
    pub jobs_released: u64,
    pub jobs_completed: u64,
    pub deadline_misses: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservationReport {
    pub id: u32,
    pub priority: u32,
    /// Lifetime budget consumed.
    pub consumed: Time,
    pub replenishments: u64,
    pub state_changes: u64,
    pub final_state: ReservationState,
}

/// Everything a run produced, serialisable as YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimReport {
    pub start: Time,
    pub end: Time,
    pub segments: Vec<Segment>,
    pub tasks: Vec<TaskReport>,
    pub reservations: Vec<ReservationReport>,
}

impl SimReport {
    pub fn task(&self, name: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn reservation(&self, id: ReservationId) -> Option<&ReservationReport> {
        self.reservations.iter().find(|r| r.id == id.0)
    }

    /// Segments executed by the task called `name`, in time order.
    pub fn segments_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Segment> + 'a {
        self.segments.iter().filter(move |s| s.task == name)
    }

    /// Total time the processor was busy.
    pub fn busy_time(&self) -> Time {
        self.segments.iter().map(Segment::duration).sum()
    }

    /// Fraction of the simulated interval the processor was busy.
    pub fn utilization(&self) -> f64 {
        let span = self.end.saturating_sub(self.start);
        if span == 0 {
            return 0.0;
        }
        self.busy_time() as f64 / span as f64
    }
}
