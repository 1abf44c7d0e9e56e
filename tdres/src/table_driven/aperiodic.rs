/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Round-robin pool of best-effort clients that run on slack.
//!
//! All table-driven reservations on one core may share a single queue.  The
//! share is an explicit `Rc<RefCell<_>>` handle: access is only sound because
//! every protocol call on that core is already serialised by the scheduling
//! context.  A multi-core environment must not hand the same queue to
//! reservations on different cores.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::reservation::{ClientId, ReservationClient, ReservationId, WorkUnit};

/// Handle to a queue shared by co-located reservations.
pub type SharedAperiodicQueue = Rc<RefCell<AperiodicQueue>>;

/// FIFO of aperiodic clients, rotated on every successful dispatch.
#[derive(Debug, Default)]
pub struct AperiodicQueue {
    clients: VecDeque<Box<dyn ReservationClient>>,
}

impl AperiodicQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh queue wrapped in a shareable handle.
    pub fn shared() -> SharedAperiodicQueue {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn push_back(&mut self, client: Box<dyn ReservationClient>) {
        self.clients.push_back(client);
    }

    /// Detach the client with `id`, if queued.
    pub fn remove(&mut self, id: ClientId) -> Option<Box<dyn ReservationClient>> {
        let pos = self.clients.iter().position(|c| c.id() == id)?;
        self.clients.remove(pos)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Offer the processor to each queued client once, front to back, on
    /// behalf of reservation `on`.
    ///
    /// The first client that yields work moves to the back of the queue.
    /// Clients that yield nothing keep their position.
    pub fn dispatch_round_robin(&mut self, on: ReservationId) -> Option<WorkUnit> {
        for i in 0..self.clients.len() {
            if let Some(work) = self.clients[i].dispatch(on) {
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
