/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Generic reservation model.
//!
//! A reservation is a guaranteed allocation of processor time to a set of
//! clients.  Concrete reservation kinds (table-driven, …) implement the
//! [`Reservation`] operation table; the environment only ever holds a
//! `Box<dyn Reservation>`.
//!
//! # State machine
//!
//! ```text
//!            first client
//! INACTIVE ──────────────► DEPLETED ◄──────── budget drained to 0
//!                             │                      ▲
//!                  replenish  │                      │
//!                             ▼                      │
//!            ┌──────────── ACTIVE ◄───────┐          │
//!  last client departs       │   client arrives      │
//!            └──────────► ACTIVE_IDLE ────┘──────────┘
//! ```
//!
//! [`ReservationCore`] carries the fields every kind shares (budget counters,
//! state, periodic client list) and the default round-robin dispatch policy.

pub mod client;

pub use client::{ClientId, ReservationClient, TaskClass, TaskClient, WorkUnit};

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::env::Environment;
use crate::table::Time;

// ── Identity & state ──────────────────────────────────────────────────────────

/// Identifier of a reservation, unique within one environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReservationId(pub u32);

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "res#{}", self.0)
    }
}

/// Budget/client state of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationState {
    /// Never had a client.
    #[default]
    Inactive,
    /// Has ready clients and budget left in the current slot.
    Active,
    /// Has budget left in the current slot but no ready client.
    ActiveIdle,
    /// No budget left; waiting for the next replenishment.
    Depleted,
}

impl ReservationState {
    /// Returns `true` while the current slot still has budget.
    pub fn has_budget(self) -> bool {
        matches!(self, ReservationState::Active | ReservationState::ActiveIdle)
    }
}

impl fmt::Display for ReservationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReservationState::Inactive => "INACTIVE",
            ReservationState::Active => "ACTIVE",
            ReservationState::ActiveIdle => "ACTIVE_IDLE",
            ReservationState::Depleted => "DEPLETED",
        };
        f.write_str(s)
    }
}

/// Result of a successful dispatch decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub work: WorkUnit,
    /// Upper bound on how long the work may run before the reservation must
    /// be consulted again.  `None` means "until the budget runs out".
    pub for_at_most: Option<Time>,
}

// ── Reservation trait ─────────────────────────────────────────────────────────

/// Operation table every reservation kind implements.
///
/// All methods are invoked from a single per-core scheduling context; the
/// environment guarantees mutual exclusion.
pub trait Reservation: fmt::Debug {
    /// Shared base fields.
    fn core(&self) -> &ReservationCore;

    fn id(&self) -> ReservationId {
        self.core().id()
    }

    fn priority(&self) -> u32 {
        self.core().priority()
    }

    fn state(&self) -> ReservationState {
        self.core().state()
    }

    fn cur_budget(&self) -> Time {
        self.core().cur_budget()
    }

    fn next_replenishment(&self) -> Time {
        self.core().next_replenishment()
    }

    fn budget_consumed_total(&self) -> Time {
        self.core().budget_consumed_total()
    }

    /// A client became ready; ownership moves into the reservation.
    fn client_arrives(&mut self, env: &mut dyn Environment, client: Box<dyn ReservationClient>);

    /// A client stopped being ready; ownership moves back to the caller.
    ///
    /// Returns `None` if the client is not attached to this reservation.
    fn client_departs(
        &mut self,
        env: &mut dyn Environment,
        client: ClientId,
        did_signal_job_completion: bool,
    ) -> Option<Box<dyn ReservationClient>>;

    /// Start the next budget period.  Called at `next_replenishment()`.
    fn replenish(&mut self, env: &mut dyn Environment);

    /// Charge `how_much` elapsed execution time to the reservation.
    fn drain_budget(&mut self, env: &mut dyn Environment, how_much: Time);

    /// Pick a client to run now.
    fn dispatch_client(&mut self, env: &mut dyn Environment) -> Option<Dispatch>;
}

// ── ReservationCore ───────────────────────────────────────────────────────────

/// Fields and behaviour shared by every reservation kind.
#[derive(Debug)]
pub struct ReservationCore {
    id: ReservationId,
    /// Lower value = higher priority.
    priority: u32,
    state: ReservationState,

    pub(crate) cur_budget: Time,
    pub(crate) budget_consumed: Time,
    pub(crate) budget_consumed_total: Time,
    pub(crate) next_replenishment: Time,

    /// Periodic clients in round-robin order.
    clients: VecDeque<Box<dyn ReservationClient>>,
}

impl ReservationCore {
    pub fn new(id: ReservationId, priority: u32) -> Self {
        Self {
            id,
            priority,
            state: ReservationState::Inactive,
            cur_budget: 0,
            budget_consumed: 0,
            budget_consumed_total: 0,
            next_replenishment: 0,
            clients: VecDeque::new(),
        }
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn state(&self) -> ReservationState {
        self.state
    }

    /// Budget left in the current slot.
    pub fn cur_budget(&self) -> Time {
        self.cur_budget
    }

    /// Budget consumed over the reservation's lifetime.
    pub fn budget_consumed_total(&self) -> Time {
        self.budget_consumed_total
    }

    pub fn next_replenishment(&self) -> Time {
        self.next_replenishment
    }

    /// Record the new state and notify the environment.
    pub fn change_state(&mut self, env: &mut dyn Environment, new_state: ReservationState) {
        if self.state != new_state {
            debug!(res = %self.id, from = %self.state, to = %new_state, "state change");
        }
        self.state = new_state;
        env.change_state(self.id, new_state);
    }

    /// Append a client at the tail of the round-robin order.
    pub fn add_client(&mut self, client: Box<dyn ReservationClient>) {
        self.clients.push_back(client);
    }

    /// Detach the client with `id`, if present.
    pub fn remove_client(&mut self, id: ClientId) -> Option<Box<dyn ReservationClient>> {
        let pos = self.clients.iter().position(|c| c.id() == id)?;
        self.clients.remove(pos)
    }

    pub fn has_clients(&self) -> bool {
        !self.clients.is_empty()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Sum of the declared execution costs of the attached clients.
    pub fn total_exec_cost(&self) -> Time {
        self.clients.iter().map(|c| c.exec_cost()).sum()
    }

    /// Default dispatch policy: the first client (in list order) that yields
    /// work is moved to the back of the list.
    ///
    /// Alternation between clients therefore happens at dispatch granularity;
    /// kinds that need finer control provide their own policy.
    ///
    /// # Panics
    /// If the reservation is not `ACTIVE`.
    pub fn default_dispatch_client(&mut self) -> Option<WorkUnit> {
        assert_eq!(
            self.state,
            ReservationState::Active,
            "{}: dispatch requested while not ACTIVE",
            self.id
        );

        for i in 0..self.clients.len() {
            if let Some(work) = self.clients[i].dispatch(self.id) {
                if let Some(client) = self.clients.remove(i) {
                    self.clients.push_back(client);
                }
                return Some(work);
            }
        }
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
