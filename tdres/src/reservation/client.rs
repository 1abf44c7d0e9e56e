/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Reservation clients: the schedulable entities a reservation serves.
//!
//! A client is anything that can be asked "do you have work to run right
//! now?".  Clients are owned by exactly one pool at a time (the periodic list
//! of a reservation or an aperiodic queue) and move between pools by value
//! (`Box<dyn ReservationClient>`), never by copy.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ReservationId;
use crate::table::Time;

// ── Identity ──────────────────────────────────────────────────────────────────

/// Identifier of a client, unique within one scheduling environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(pub u32);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

// ── Task class ────────────────────────────────────────────────────────────────

/// Real-time class of the workload behind a client.
///
/// `Hard` and `Soft` clients are periodic: their declared execution cost is
/// reserved out of every slot.  `BestEffort` clients are aperiodic and only
/// ever run on slack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskClass {
    #[default]
    Hard,
    Soft,
    BestEffort,
}

impl TaskClass {
    /// Returns `true` for classes served only from slack.
    pub fn is_aperiodic(self) -> bool {
        matches!(self, TaskClass::BestEffort)
    }
}

impl fmt::Display for TaskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskClass::Hard => "hard",
            TaskClass::Soft => "soft",
            TaskClass::BestEffort => "best_effort",
        };
        f.write_str(s)
    }
}

// ── Work unit ─────────────────────────────────────────────────────────────────

/// A runnable piece of work handed out by a client's `dispatch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkUnit {
    pub client: ClientId,
    /// Client-defined sequence number of the job being run.
    pub job: u64,
}

// ── ReservationClient ─────────────────────────────────────────────────────────

/// A schedulable entity attached to a reservation.
pub trait ReservationClient: fmt::Debug {
    fn id(&self) -> ClientId;

    fn class(&self) -> TaskClass;

    /// Declared worst-case execution cost per slot.  Ignored for aperiodic
    /// clients.
    fn exec_cost(&self) -> Time;

    /// Offer the client the processor on behalf of reservation `on`.
    ///
    /// Returns the work to run, or `None` if the client currently has nothing
    /// runnable.  Clients in a shared aperiodic queue may be dispatched by any
    /// reservation of the core, so `on` is the reservation lending the time.
    fn dispatch(&mut self, on: ReservationId) -> Option<WorkUnit>;
}

// ── TaskClient ────────────────────────────────────────────────────────────────

/// A plain client with a fixed class and cost that is either always or never
/// runnable.
///
/// Each successful dispatch is numbered as a new job and the reservation that
/// dispatched it is remembered.
#[derive(Debug, Clone)]
pub struct TaskClient {
    id: ClientId,
    class: TaskClass,
    exec_cost: Time,
    runnable: bool,
    dispatches: u64,
    last_reservation: Option<ReservationId>,
}

impl TaskClient {
    /// A runnable periodic client of class `Hard`.
    pub fn periodic(id: u32, exec_cost: Time) -> Self {
        Self::new(ClientId(id), TaskClass::Hard, exec_cost)
    }

    /// A runnable best-effort client.
    pub fn best_effort(id: u32) -> Self {
        Self::new(ClientId(id), TaskClass::BestEffort, 0)
    }

    pub fn new(id: ClientId, class: TaskClass, exec_cost: Time) -> Self {
        Self {
            id,
            class,
            exec_cost,
            runnable: true,
            dispatches: 0,
            last_reservation: None,
        }
    }

    /// Same client, but never yielding work.
    pub fn blocked(mut self) -> Self {
        self.runnable = false;
        self
    }

    pub fn dispatches(&self) -> u64 {
        self.dispatches
    }

    /// Reservation that most recently dispatched this client.
    pub fn last_reservation(&self) -> Option<ReservationId> {
        self.last_reservation
    }
}

impl ReservationClient for TaskClient {
    fn id(&self) -> ClientId {
        self.id
    }

    fn class(&self) -> TaskClass {
        self.class
    }

    fn exec_cost(&self) -> Time {
        self.exec_cost
    }

    fn dispatch(&mut self, on: ReservationId) -> Option<WorkUnit> {
        if !self.runnable {
            return None;
        }
        self.dispatches += 1;
        self.last_reservation = Some(on);
        Some(WorkUnit {
            client: self.id,
            job: self.dispatches,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
