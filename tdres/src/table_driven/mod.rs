/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Table-driven reservation with slack stealing.
//!
//! The reservation is eligible to run only inside the slots of its
//! [`IntervalTable`], which repeats every major cycle.  Its budget is not a
//! counter but the time left until the end of the current slot, so it can
//! never overrun into the next reservation's slot.
//!
//! Periodic clients (`Hard` / `Soft`) declare an execution cost that is
//! reserved out of every slot.  Whatever is left over is slack and is lent to
//! best-effort clients from an [`AperiodicQueue`], which may be shared by all
//! table-driven reservations of the core.
//!
//! # Slot navigation
//! ```text
//! cursor ──► table[cursor] + major_cycle_start = next slot to activate
//!
//! replenish():  cur_interval = major_cycle_start + table[cursor]
//!               cursor = (cursor + 1) % len      (wrap ⇒ major_cycle_start += major_cycle)
//!               next_replenishment = major_cycle_start + table[cursor].start
//! ```
//!
//! # Fatal conditions
//! Replenishing or draining an `INACTIVE` reservation, draining a `DEPLETED`
//! one, draining before the current slot started, dispatching while not
//! `ACTIVE` and a client departing from an `INACTIVE`/`ACTIVE_IDLE`
//! reservation all panic: the accounting is corrupt and must not continue.
//! Running out of budget during dispatch is the one recoverable case (see
//! [`dispatch_client`](Reservation::dispatch_client)).

pub mod aperiodic;
pub mod slack;

pub use aperiodic::{AperiodicQueue, SharedAperiodicQueue};
pub use slack::{SlackPolicy, SlackTracker, MIN_LENDABLE_SLACK};

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::env::Environment;
use crate::reservation::{
    ClientId, Dispatch, Reservation, ReservationClient, ReservationCore, ReservationId,
    ReservationState,
};
use crate::table::cycle::{current_cycle_start, next_cycle_start, time_remaining_in_slot};
use crate::table::{Interval, IntervalTable, Time};

// ── TableDrivenReservation ────────────────────────────────────────────────────

/// A reservation driven by a cyclic table of slots.
#[derive(Debug)]
pub struct TableDrivenReservation {
    core: ReservationCore,
    table: Arc<IntervalTable>,

    /// Index of the next slot to activate.
    next_interval: usize,
    /// Absolute bounds of the current slot.
    cur_interval: Interval,
    /// Absolute start of the major cycle `next_interval` belongs to.
    major_cycle_start: Time,

    slack: SlackTracker,
    aperiodic: SharedAperiodicQueue,
}

impl TableDrivenReservation {
    /// Create an `INACTIVE` reservation over `table`.
    ///
    /// Pass a clone of a [`SharedAperiodicQueue`] to share best-effort clients
    /// with the other reservations of the same core.
    pub fn new(
        id: ReservationId,
        priority: u32,
        table: Arc<IntervalTable>,
        policy: SlackPolicy,
        aperiodic: SharedAperiodicQueue,
    ) -> Self {
        Self {
            core: ReservationCore::new(id, priority),
            table,
            next_interval: 0,
            cur_interval: Interval::default(),
            major_cycle_start: 0,
            slack: SlackTracker::new(policy),
            aperiodic,
        }
    }

    /// Same as [`new`](Self::new) with a queue of its own.
    pub fn with_private_queue(
        id: ReservationId,
        priority: u32,
        table: Arc<IntervalTable>,
        policy: SlackPolicy,
    ) -> Self {
        Self::new(id, priority, table, policy, AperiodicQueue::shared())
    }

    pub fn next_interval_index(&self) -> usize {
        self.next_interval
    }

    /// Absolute bounds of the slot activated by the last replenishment.
    pub fn current_interval(&self) -> Interval {
        self.cur_interval
    }

    pub fn major_cycle_start(&self) -> Time {
        self.major_cycle_start
    }

    pub fn slack(&self) -> &SlackTracker {
        &self.slack
    }

    /// Start of the major cycle containing the environment's current time.
    pub fn current_cycle_start(&self, env: &dyn Environment) -> Time {
        current_cycle_start(env.current_time(), env.time_zero(), self.table.major_cycle())
    }

    /// Start of the major cycle after the current one.
    pub fn next_cycle_start(&self, env: &dyn Environment) -> Time {
        next_cycle_start(env.current_time(), env.time_zero(), self.table.major_cycle())
    }

    /// Time left in the current slot.
    pub fn time_remaining_in_slot(&self, env: &dyn Environment) -> Time {
        let now = env.current_time();
        let remaining = time_remaining_in_slot(now, self.cur_interval.end);
        trace!(
            res = %self.core.id(),
            start = self.cur_interval.start,
            now,
            end = self.cur_interval.end,
            state = %self.core.state(),
            remaining,
            "time remaining in slot"
        );
        remaining
    }

    /// Periodic clients attached to this reservation, plus anything waiting in
    /// its aperiodic queue.
    fn has_any_client(&self) -> bool {
        self.core.has_clients() || !self.aperiodic.borrow().is_empty()
    }

    fn update_execution_cost(&mut self) {
        let total = self.core.total_exec_cost();
        self.slack.set_expected_exec_cost(total);
        trace!(res = %self.core.id(), expected_exec_cost = total, "execution cost updated");
    }

    /// Lend the current slack to the next runnable best-effort client.
    ///
    /// Only `TickBounded` bounds the run by the allowance.  A `Cumulative`
    /// lender lets the client run until the slot drains or the next dispatch
    /// decision re-derives slack.
    fn dispatch_aperiodic_client(&mut self) -> Option<Dispatch> {
        let id = self.core.id();
        let work = self.aperiodic.borrow_mut().dispatch_round_robin(id)?;
        let allowance = self.slack.lend();
        let for_at_most = match self.slack.policy() {
            SlackPolicy::TickBounded => Some(allowance),
            SlackPolicy::Cumulative => None,
        };
        trace!(
            res = %id,
            client = %work.client,
            slack = allowance,
            ?for_at_most,
            "dispatching aperiodic client"
        );
        Some(Dispatch { work, for_at_most })
    }
}

impl Reservation for TableDrivenReservation {
    fn core(&self) -> &ReservationCore {
        &self.core
    }

    fn client_arrives(&mut self, env: &mut dyn Environment, client: Box<dyn ReservationClient>) {
        let id = self.core.id();
        let client_id = client.id();
        let class = client.class();

        if class.is_aperiodic() {
            debug!(res = %id, client = %client_id, "adding aperiodic client");
            self.aperiodic.borrow_mut().push_back(client);
        } else {
            let exec_cost = client.exec_cost();
            if exec_cost == 0 {
                warn!(res = %id, client = %client_id, %class, "periodic client declares zero execution cost");
            }
            debug!(res = %id, client = %client_id, %class, exec_cost, "adding periodic client");
            self.core.add_client(client);
            self.update_execution_cost();
        }

        match self.core.state() {
            ReservationState::Inactive => {
                // First client: wait for slot 0 of the next major cycle.
                self.major_cycle_start = self.next_cycle_start(env);
                self.next_interval = 0;
                let next = self.major_cycle_start + self.table.slot(0).start;
                self.core.next_replenishment = next;
                debug!(
                    res = %id,
                    major_cycle_start = self.major_cycle_start,
                    next_replenishment = next,
                    "first client, awaiting first slot"
                );
                env.request_wakeup_no_later_than(next);
                self.core.change_state(env, ReservationState::Depleted);
            }
            ReservationState::Active | ReservationState::Depleted => {}
            ReservationState::ActiveIdle => {
                self.core.change_state(env, ReservationState::Active);
            }
        }
    }

    fn client_departs(
        &mut self,
        env: &mut dyn Environment,
        client: ClientId,
        did_signal_job_completion: bool,
    ) -> Option<Box<dyn ReservationClient>> {
        let id = self.core.id();
        let removed = match self.core.remove_client(client) {
            Some(c) => {
                self.update_execution_cost();
                Some(c)
            }
            None => self.aperiodic.borrow_mut().remove(client),
        };

        let Some(removed) = removed else {
            warn!(res = %id, %client, "departing client is not attached to this reservation");
            return None;
        };
        debug!(res = %id, %client, did_signal_job_completion, "client departs");

        match self.core.state() {
            state @ (ReservationState::Inactive | ReservationState::ActiveIdle) => {
                panic!("{id}: {client} departed while {state}, which has no clients")
            }
            ReservationState::Active => {
                if !self.has_any_client() {
                    self.core.change_state(env, ReservationState::ActiveIdle);
                }
            }
            ReservationState::Depleted => {}
        }

        Some(removed)
    }

    fn replenish(&mut self, env: &mut dyn Environment) {
        let id = self.core.id();
        let state = self.core.state();
        assert_ne!(
            state,
            ReservationState::Inactive,
            "{id}: replenish on an INACTIVE reservation"
        );
        trace!(
            res = %id,
            expected_replenishment = self.core.next_replenishment,
            "replenish"
        );

        // Activate the slot under the cursor.
        let slot = self.table.slot(self.next_interval);
        self.cur_interval = slot.offset_by(self.major_cycle_start);
        trace!(
            res = %id,
            major_cycle_start = self.major_cycle_start,
            start = self.cur_interval.start,
            end = self.cur_interval.end,
            "current slot"
        );

        // Reset budget; a late replenishment only gets what is left of the slot.
        let budget = self.time_remaining_in_slot(env).min(slot.duration());
        self.core.cur_budget = budget;
        self.core.budget_consumed = 0;
        if budget == 0 {
            warn!(res = %id, slot_end = self.cur_interval.end, "replenished with zero budget");
        }

        // Clients may have changed since the last slot.
        self.update_execution_cost();
        let slack = self.slack.reset(budget);
        trace!(res = %id, budget, slack, "budget and slack reset");

        // Prepare the next slot.
        self.next_interval = (self.next_interval + 1) % self.table.len();
        if self.next_interval == 0 {
            self.major_cycle_start += self.table.major_cycle();
            debug!(res = %id, major_cycle_start = self.major_cycle_start, "wrapped to next major cycle");
        }
        let next = self.major_cycle_start + self.table.slot(self.next_interval).start;
        self.core.next_replenishment = next;
        trace!(res = %id, next_replenishment = next, "next replenishment");
        env.request_wakeup_no_later_than(next);

        let new_state = if self.has_any_client() {
            ReservationState::Active
        } else {
            ReservationState::ActiveIdle
        };
        self.core.change_state(env, new_state);
    }

    fn drain_budget(&mut self, env: &mut dyn Environment, how_much: Time) {
        let id = self.core.id();
        self.core.budget_consumed += how_much;
        self.core.budget_consumed_total += how_much;

        let now = env.current_time();
        assert!(
            self.cur_interval.start <= now,
            "{id}: drain at {now} before the current slot starts at {}",
            self.cur_interval.start
        );

        match self.core.state() {
            state @ (ReservationState::Inactive | ReservationState::Depleted) => {
                panic!("{id}: drain_budget while {state}")
            }
            ReservationState::Active | ReservationState::ActiveIdle => {
                let budget = self.time_remaining_in_slot(env);
                self.core.cur_budget = budget;
                trace!(res = %id, how_much, budget, "drained");

                if budget == 0 {
                    self.slack.reclaim();
                    self.core.change_state(env, ReservationState::Depleted);
                } else if let Some(left) = self.slack.charge(how_much) {
                    trace!(res = %id, running_slack = left, "drained running slack");
                    env.request_wakeup_after(left);
                }
            }
        }
    }

    fn dispatch_client(&mut self, env: &mut dyn Environment) -> Option<Dispatch> {
        let id = self.core.id();
        assert_eq!(
            self.core.state(),
            ReservationState::Active,
            "{id}: dispatch requested while not ACTIVE"
        );

        let budget = self.time_remaining_in_slot(env);
        self.core.cur_budget = budget;
        self.slack.recompute(budget, self.core.budget_consumed);

        let lend = self.slack.can_lend() && !self.aperiodic.borrow().is_empty();
        let aperiodic = if lend {
            self.dispatch_aperiodic_client()
        } else {
            None
        };
        let picked = aperiodic.or_else(|| {
            self.slack.reclaim();
            let work = self.core.default_dispatch_client()?;
            trace!(res = %id, client = %work.client, "dispatching periodic client");
            Some(Dispatch {
                work,
                for_at_most: None,
            })
        });

        trace!(
            res = %id,
            budget,
            slack = self.slack.cur_slack(),
            next = self.next_interval,
            "dispatch decision"
        );

        if budget == 0 {
            // Only reachable with overlapping slots across reservations:
            // running now would overload the next slot's owner.
            warn!(
                res = %id,
                "budget unexpectedly depleted (check scheduling table for unintended overlap)"
            );
            self.slack.reclaim();
            self.core.change_state(env, ReservationState::Depleted);
            return None;
        }
        picked
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
