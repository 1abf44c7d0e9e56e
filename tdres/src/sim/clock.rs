/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Event-driven clock of the uniprocessor simulator.

use std::collections::BTreeMap;

use tracing::debug;

use crate::env::Environment;
use crate::reservation::{ReservationId, ReservationState};
use crate::table::Time;

/// [`Environment`] implementation owned by the [`Simulator`](super::Simulator).
///
/// Wake-up requests are collected per simulation step and cleared by
/// [`begin_step`](Self::begin_step); the simulator folds the earliest one into
/// its next-event computation.
#[derive(Debug, Default)]
pub struct SimClock {
    now: Time,
    time_zero: Time,
    wakeup: Option<Time>,
    /// reservation → number of reported state changes.
    ///
    /// `BTreeMap` so the report lists reservations in id order.
    state_changes: BTreeMap<ReservationId, u64>,
}

impl SimClock {
    pub fn new(time_zero: Time) -> Self {
        Self {
            now: time_zero,
            time_zero,
            ..Self::default()
        }
    }

    /// Move to `now` and forget the previous step's wake-up requests.
    pub fn begin_step(&mut self, now: Time) {
        debug_assert!(now >= self.now, "simulation time went backwards");
        self.now = now;
        self.wakeup = None;
    }

    /// Earliest wake-up requested during the current step.
    pub fn wakeup(&self) -> Option<Time> {
        self.wakeup
    }

    pub fn state_changes(&self, res: ReservationId) -> u64 {
        self.state_changes.get(&res).copied().unwrap_or(0)
    }
}

impl Environment for SimClock {
    fn current_time(&self) -> Time {
        self.now
    }

    fn time_zero(&self) -> Time {
        self.time_zero
    }

    fn change_state(&mut self, res: ReservationId, new_state: ReservationState) {
        debug!(now = self.now, %res, state = %new_state, "reservation state change");
        *self.state_changes.entry(res).or_insert(0) += 1;
    }

    fn request_wakeup_no_later_than(&mut self, when: Time) {
        self.wakeup = Some(self.wakeup.map_or(when, |w| w.min(when)));
    }
}
