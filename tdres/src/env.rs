/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The scheduling environment a reservation runs in.
//!
//! A reservation never reads a clock or arms a timer itself.  Every protocol
//! call receives a `&mut dyn Environment` that supplies the current time and
//! accepts two kinds of callbacks:
//!
//! * [`Environment::change_state`]: the reservation moved to a new
//!   [`ReservationState`]; the environment re-files it (active / depleted
//!   lists).
//! * [`Environment::request_wakeup_no_later_than`]: call back into the
//!   scheduler no later than the given absolute time.  There is no
//!   cancellation: a later request with an earlier deadline supersedes any
//!   pending one.
//!
//! The environment serialises all calls (one scheduling context per core);
//! nothing here is thread-safe.

use crate::reservation::{ReservationId, ReservationState};
use crate::table::Time;

/// Capabilities a reservation needs from its scheduling environment.
pub trait Environment {
    /// Current absolute time.
    fn current_time(&self) -> Time;

    /// Epoch of the major-cycle grid.
    fn time_zero(&self) -> Time;

    /// Notification that `res` is now in `new_state`.
    fn change_state(&mut self, res: ReservationId, new_state: ReservationState);

    /// Ask to be invoked again no later than the absolute time `when`.
    fn request_wakeup_no_later_than(&mut self, when: Time);

    /// Relative form of [`request_wakeup_no_later_than`](Self::request_wakeup_no_later_than).
    fn request_wakeup_after(&mut self, timeout: Time) {
        let when = self.current_time().saturating_add(timeout);
        self.request_wakeup_no_later_than(when);
    }
}

// ── ManualEnvironment ─────────────────────────────────────────────────────────

/// An environment whose clock is advanced by hand.
///
/// Records every state change and keeps the earliest pending wake-up, which
/// makes it suitable for driving a reservation step by step from tests or
/// from an embedding scheduler that has its own event loop.
#[derive(Debug, Clone, Default)]
pub struct ManualEnvironment {
    now: Time,
    time_zero: Time,
    transitions: Vec<(ReservationId, ReservationState)>,
    wakeup: Option<Time>,
}

impl ManualEnvironment {
    /// A clock at `time_zero`, with the cycle grid anchored there.
    pub fn new(time_zero: Time) -> Self {
        Self {
            now: time_zero,
            time_zero,
            ..Self::default()
        }
    }

    /// Move the clock to `now`.
    ///
    /// # Panics
    /// If `now` is earlier than the current time; time is monotonic.
    pub fn set_time(&mut self, now: Time) {
        assert!(
            now >= self.now,
            "time must not go backwards ({} -> {})",
            self.now,
            now
        );
        self.now = now;
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&mut self, delta: Time) {
        self.now += delta;
    }

    /// Every `(reservation, state)` change reported so far, oldest first.
    pub fn transitions(&self) -> &[(ReservationId, ReservationState)] {
        &self.transitions
    }

    /// Most recent state reported for `res`.
    pub fn last_state_of(&self, res: ReservationId) -> Option<ReservationState> {
        self.transitions
            .iter()
            .rev()
            .find(|(id, _)| *id == res)
            .map(|(_, s)| *s)
    }

    /// Earliest pending wake-up request.
    pub fn pending_wakeup(&self) -> Option<Time> {
        self.wakeup
    }

    /// Take the pending wake-up, clearing it.
    pub fn take_wakeup(&mut self) -> Option<Time> {
        self.wakeup.take()
    }
}

impl Environment for ManualEnvironment {
    fn current_time(&self) -> Time {
        self.now
    }

    fn time_zero(&self) -> Time {
        self.time_zero
    }

    fn change_state(&mut self, res: ReservationId, new_state: ReservationState) {
        self.transitions.push((res, new_state));
    }

    fn request_wakeup_no_later_than(&mut self, when: Time) {
        self.wakeup = Some(self.wakeup.map_or(when, |w| w.min(when)));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earlier_wakeup_supersedes_later_one() {
        let mut env = ManualEnvironment::new(0);
        env.request_wakeup_no_later_than(500);
        env.request_wakeup_no_later_than(200);
        env.request_wakeup_no_later_than(300);
        assert_eq!(env.pending_wakeup(), Some(200));
        assert_eq!(env.take_wakeup(), Some(200));
        assert_eq!(env.pending_wakeup(), None);
    }

    #[test]
    fn relative_wakeup_is_anchored_at_now() {
        let mut env = ManualEnvironment::new(0);
        env.set_time(1_000);
        env.request_wakeup_after(25);
        assert_eq!(env.pending_wakeup(), Some(1_025));
    }

    #[test]
    fn transitions_are_recorded_in_order() {
        let mut env = ManualEnvironment::new(0);
        let id = ReservationId(3);
        env.change_state(id, ReservationState::Depleted);
        env.change_state(id, ReservationState::Active);
        assert_eq!(env.transitions().len(), 2);
        assert_eq!(env.last_state_of(id), Some(ReservationState::Active));
        assert_eq!(env.last_state_of(ReservationId(9)), None);
    }

    #[test]
    #[should_panic(expected = "time must not go backwards")]
    fn clock_is_monotonic() {
        let mut env = ManualEnvironment::new(100);
        env.set_time(99);
    }
}
