/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Uniprocessor simulation of table-driven reservations.
//!
//! [`Simulator`] plays the scheduling environment for every reservation of a
//! [`ScheduleConfig`] on one core and drives the workload the file
//! describes.  Time jumps from event to event; at every event the
//! reservations see the protocol in this order:
//!
//! ```text
//! 1. account   charge the running segment to its task
//! 2. drain     running reservation by the elapsed time, other budgeted ones by 0
//! 3. replenish DEPLETED reservations whose next replenishment has come
//! 4. complete  finished jobs depart (signalling completion)
//! 5. release   new jobs arrive; a periodic job still pending is a deadline miss
//! 6. dispatch  first ACTIVE reservation, by (priority, id), that yields work
//! ```
//!
//! The next event is the earliest of: a wake-up requested by a reservation, a
//! pending replenishment, the end of a budgeted slot, a job release, the
//! running job's completion, the dispatch allowance and the end of the
//! horizon.

pub mod clock;
pub mod report;
pub mod task;

pub use clock::SimClock;
pub use report::{ReservationReport, Segment, SimReport, TaskReport};
pub use task::{SimTask, TaskStats};

use tracing::{debug, info, trace, warn};

use crate::config::{ConfigError, ScheduleConfig};
use crate::reservation::{Reservation, ReservationState};
use crate::table::Time;
use crate::table_driven::AperiodicQueue;

/// What occupies the processor between two events.
#[derive(Debug, Clone, Copy)]
struct Running {
    res_index: usize,
    task_index: usize,
    since: Time,
    /// Absolute end of the dispatch allowance, if bounded.
    until: Option<Time>,
}

pub struct Simulator {
    clock: SimClock,
    /// Ordered by `(priority, id)`.
    reservations: Vec<Box<dyn Reservation>>,
    replenishments: Vec<u64>,
    tasks: Vec<SimTask>,
    running: Option<Running>,
    segments: Vec<Segment>,
    start: Time,
    end: Time,
}

impl Simulator {
    /// Build reservations and tasks from a validated schedule.
    ///
    /// # Errors
    /// [`ConfigError::UnknownReservation`] if a task names a reservation the
    /// schedule does not declare.
    pub fn new(config: &ScheduleConfig) -> Result<Self, ConfigError> {
        let mut res_configs: Vec<_> = config.reservations.iter().collect();
        res_configs.sort_by_key(|r| (r.priority, r.id));

        let shared = AperiodicQueue::shared();
        let reservations: Vec<Box<dyn Reservation>> = res_configs
            .iter()
            .map(|r| {
                let queue = if config.share_aperiodic_queue {
                    shared.clone()
                } else {
                    AperiodicQueue::shared()
                };
                Box::new(r.build(queue)) as Box<dyn Reservation>
            })
            .collect();

        let mut tasks = Vec::with_capacity(config.tasks.len());
        for task in &config.tasks {
            let res_index = reservations
                .iter()
                .position(|r| r.id() == task.reservation)
                .ok_or_else(|| ConfigError::UnknownReservation {
                    task: task.name.clone(),
                    reservation: task.reservation.0,
                })?;
            tasks.push(SimTask::new(task.clone(), res_index, config.time_zero));
        }

        Ok(Self {
            clock: SimClock::new(config.time_zero),
            replenishments: vec![0; reservations.len()],
            reservations,
            tasks,
            running: None,
            segments: Vec::new(),
            start: config.time_zero,
            end: config.time_zero + config.horizon,
        })
    }

    /// Run until the end of the horizon and collect the results.
    pub fn run(mut self) -> SimReport {
        info!(
            start = self.start,
            end = self.end,
            reservations = self.reservations.len(),
            tasks = self.tasks.len(),
            "Simulation starting"
        );

        let mut now = self.start;
        loop {
            self.advance_to(now);
            if now >= self.end {
                break;
            }
            self.release_jobs(now);
            self.dispatch(now);
            now = self.next_event(now);
        }

        let report = self.into_report();
        info!(
            segments = report.segments.len(),
            busy = report.busy_time(),
            "Simulation finished"
        );
        report
    }

    /// Steps 1–4: bring every reservation up to `now`.
    fn advance_to(&mut self, now: Time) {
        self.clock.begin_step(now);
        trace!(now, "simulation step");

        // account
        let running = self.running.take();
        let mut elapsed = 0;
        if let Some(run) = running {
            elapsed = now - run.since;
            if elapsed > 0 {
                let task = &mut self.tasks[run.task_index];
                task.execute(elapsed);
                self.record_segment(run, now);
            }
        }

        // drain
        for (i, res) in self.reservations.iter_mut().enumerate() {
            if !res.state().has_budget() {
                continue;
            }
            let how_much = match running {
                Some(run) if run.res_index == i => elapsed,
                _ => 0,
            };
            res.drain_budget(&mut self.clock, how_much);
        }

        // replenish, earliest due first
        let mut due: Vec<usize> = (0..self.reservations.len())
            .filter(|&i| {
                let res = &self.reservations[i];
                res.state() == ReservationState::Depleted && res.next_replenishment() <= now
            })
            .collect();
        due.sort_by_key(|&i| self.reservations[i].next_replenishment());
        for i in due {
            self.reservations[i].replenish(&mut self.clock);
            self.replenishments[i] += 1;
        }

        // complete
        for task in &mut self.tasks {
            if !task.is_attached() || task.remaining() > 0 {
                continue;
            }
            let res = &mut self.reservations[task.res_index];
            match res.client_departs(&mut self.clock, task.id(), true) {
                Some(client) => {
                    debug!(now, task = %task.config.name, "job completed");
                    task.park(client);
                }
                None => warn!(task = %task.config.name, res = %res.id(), "completed job not found at its reservation"),
            }
        }
    }

    /// Step 5.
    fn release_jobs(&mut self, now: Time) {
        for task in &mut self.tasks {
            let Some(release) = task.next_release else {
                continue;
            };
            if release > now {
                continue;
            }

            let config = &task.config;
            let work = if config.class.is_aperiodic() {
                task.next_release = None;
                config.demand
            } else {
                task.next_release = Some(release + config.period);
                config.exec_cost
            };

            if task.is_attached() {
                task.stats.deadline_misses += 1;
                warn!(
                    now,
                    task = %config.name,
                    remaining = task.remaining(),
                    "deadline miss, release skipped"
                );
                continue;
            }

            debug!(now, task = %config.name, work, "job released");
            if let Some(client) = task.release(work) {
                let res = &mut self.reservations[task.res_index];
                res.client_arrives(&mut self.clock, client);
            }
        }
    }

    /// Step 6.
    fn dispatch(&mut self, now: Time) {
        for (i, res) in self.reservations.iter_mut().enumerate() {
            if res.state() != ReservationState::Active {
                continue;
            }
            let Some(decision) = res.dispatch_client(&mut self.clock) else {
                continue;
            };
            let Some(task_index) = self.tasks.iter().position(|t| t.id() == decision.work.client)
            else {
                warn!(client = %decision.work.client, "dispatched client has no task");
                continue;
            };
            trace!(
                now,
                res = %res.id(),
                task = %self.tasks[task_index].config.name,
                for_at_most = ?decision.for_at_most,
                "dispatched"
            );
            self.running = Some(Running {
                res_index: i,
                task_index,
                since: now,
                until: decision.for_at_most.map(|t| now + t),
            });
            return;
        }
    }

    /// Earliest future event, never later than the end of the horizon.
    fn next_event(&self, now: Time) -> Time {
        let mut candidates: Vec<Time> = Vec::new();
        candidates.extend(self.clock.wakeup());

        for res in &self.reservations {
            match res.state() {
                ReservationState::Depleted => candidates.push(res.next_replenishment()),
                s if s.has_budget() => candidates.push(now + res.cur_budget()),
                _ => {}
            }
        }
        candidates.extend(self.tasks.iter().filter_map(|t| t.next_release));
        if let Some(run) = self.running {
            candidates.push(now + self.tasks[run.task_index].remaining());
            candidates.extend(run.until);
        }

        candidates
            .into_iter()
            .filter(|&t| t > now)
            .fold(self.end, Time::min)
    }

    fn record_segment(&mut self, run: Running, now: Time) {
        let reservation = self.reservations[run.res_index].id().0;
        let client = self.tasks[run.task_index].id().0;
        if let Some(last) = self.segments.last_mut() {
            if last.end == run.since && last.reservation == reservation && last.client == client {
                last.end = now;
                return;
            }
        }
        self.segments.push(Segment {
            start: run.since,
            end: now,
            reservation,
            task: self.tasks[run.task_index].config.name.clone(),
            client,
        });
    }

    fn into_report(self) -> SimReport {
        let tasks = self
            .tasks
            .iter()
            .map(|t| TaskReport {
                name: t.config.name.clone(),
                client: t.id().0,
                class: t.config.class,
                reservation: t.config.reservation.0,
                executed: t.stats.executed,
                jobs_released: t.stats.jobs_released,
                jobs_completed: t.stats.jobs_completed,
                deadline_misses: t.stats.deadline_misses,
            })
            .collect();

        let mut reservations: Vec<ReservationReport> = self
            .reservations
            .iter()
            .zip(&self.replenishments)
            .map(|(r, &replenishments)| ReservationReport {
                id: r.id().0,
                priority: r.priority(),
                consumed: r.budget_consumed_total(),
                replenishments,
                state_changes: self.clock.state_changes(r.id()),
                final_state: r.state(),
            })
            .collect();
        reservations.sort_by_key(|r| r.id);

        SimReport {
            start: self.start,
            end: self.end,
            segments: self.segments,
            tasks,
            reservations,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
