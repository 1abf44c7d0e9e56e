/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Simulated workloads.
//!
//! A [`SimTask`] owns the job bookkeeping; the [`SimClient`] it hands to a
//! reservation only sees the job through a shared `Rc<RefCell<JobState>>`, so
//! the simulator can charge executed time while the client is owned by a
//! reservation or an aperiodic queue.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::TaskConfig;
use crate::reservation::{ClientId, ReservationClient, ReservationId, TaskClass, WorkUnit};
use crate::table::Time;

/// Execution state of a task's current job.
#[derive(Debug, Default)]
pub struct JobState {
    /// Execution time still owed to the current job; `0` when idle.
    pub remaining: Time,
    /// Sequence number of the current (or last) job, starting at 1.
    pub seq: u64,
}

/// The part of a task a reservation owns while a job is pending.
#[derive(Debug)]
pub struct SimClient {
    id: ClientId,
    class: TaskClass,
    exec_cost: Time,
    job: Rc<RefCell<JobState>>,
}

impl ReservationClient for SimClient {
    fn id(&self) -> ClientId {
        self.id
    }

    fn class(&self) -> TaskClass {
        self.class
    }

    fn exec_cost(&self) -> Time {
        self.exec_cost
    }

    fn dispatch(&mut self, _on: ReservationId) -> Option<WorkUnit> {
        let job = self.job.borrow();
        (job.remaining > 0).then(|| WorkUnit {
            client: self.id,
            job: job.seq,
        })
    }
}

/// Per-task counters collected during a run.
#[derive(Debug, Default, Clone, Copy)]
pub struct TaskStats {
    pub executed: Time,
    pub jobs_released: u64,
    pub jobs_completed: u64,
    pub deadline_misses: u64,
}

/// A configured task plus its run-time state.
#[derive(Debug)]
pub struct SimTask {
    pub config: TaskConfig,
    /// Position of the task's reservation in the simulator's list.
    pub res_index: usize,
    job: Rc<RefCell<JobState>>,
    /// The client while no job is pending; `None` while it is attached.
    parked: Option<Box<dyn ReservationClient>>,
    /// Absolute time of the next release, if any.
    pub next_release: Option<Time>,
    pub stats: TaskStats,
}

impl SimTask {
    pub fn new(config: TaskConfig, res_index: usize, time_zero: Time) -> Self {
        let job = Rc::new(RefCell::new(JobState::default()));
        let client = SimClient {
            id: config.id,
            class: config.class,
            exec_cost: config.exec_cost,
            job: Rc::clone(&job),
        };
        let next_release = Some(time_zero + config.phase);
        Self {
            config,
            res_index,
            job,
            parked: Some(Box::new(client)),
            next_release,
            stats: TaskStats::default(),
        }
    }

    pub fn id(&self) -> ClientId {
        self.config.id
    }

    pub fn is_attached(&self) -> bool {
        self.parked.is_none()
    }

    pub fn remaining(&self) -> Time {
        self.job.borrow().remaining
    }

    /// Charge `elapsed` units of execution to the current job.
    pub fn execute(&mut self, elapsed: Time) {
        let mut job = self.job.borrow_mut();
        let run = elapsed.min(job.remaining);
        job.remaining -= run;
        self.stats.executed += run;
    }

    /// Start a new job owing `work` units.  Returns the client to attach, or
    /// `None` when the job is already complete (`work == 0`) or the client is
    /// still attached.
    pub fn release(&mut self, work: Time) -> Option<Box<dyn ReservationClient>> {
        {
            let mut job = self.job.borrow_mut();
            job.seq += 1;
            job.remaining = work;
        }
        self.stats.jobs_released += 1;
        if work == 0 {
            self.stats.jobs_completed += 1;
            return None;
        }
        self.parked.take()
    }

    /// The client came back from its reservation after completing a job.
    pub fn park(&mut self, client: Box<dyn ReservationClient>) {
        self.stats.jobs_completed += 1;
        self.parked = Some(client);
    }
}
