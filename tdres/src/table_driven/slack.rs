/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Slack accounting for one table-driven reservation.
//!
//! Slack is the part of the current slot that periodic clients are not
//! expected to need:
//!
//! ```text
//! slack = (budget_available + budget_consumed) - (expected_exec_cost + slack_consumed)
//! ```
//!
//! clamped at zero and at the budget still available.  `budget_available +
//! budget_consumed` is what the slot still offers plus what this reservation
//! already used of it; time the reservation spends neither running nor
//! lending erodes slack first.
//!
//! Two accounting policies exist and each reservation uses exactly one:
//!
//! | Policy | Lending bound | Forced preemption |
//! |---|---|---|
//! | [`SlackPolicy::TickBounded`] | allowance = slack at dispatch | wake-up re-armed on every drain until the allowance is spent |
//! | [`SlackPolicy::Cumulative`]  | none; the client runs until the slot drains | none; slack is re-derived at the next dispatch decision |

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::table::Time;

/// Slack must exceed this many time units before it is lent out.
pub const MIN_LENDABLE_SLACK: Time = 1;

/// How lent slack is tracked while a best-effort client runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlackPolicy {
    /// Track a running allowance and request a wake-up when it is exhausted,
    /// forcing the best-effort client off the processor.
    #[default]
    TickBounded,
    /// Re-derive slack at each dispatch; never arm a preemption wake-up.
    Cumulative,
}

/// Per-slot slack state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackTracker {
    policy: SlackPolicy,
    /// Sum of the declared costs of the attached periodic clients.
    expected_exec_cost: Time,
    /// Slack consumed by best-effort clients in the current slot.
    slack_consumed: Time,
    /// Allowance left for the best-effort client currently running
    /// (`TickBounded` only).
    running_slack: Time,
    cur_slack: Time,
    /// A best-effort client was the last one dispatched.
    lending: bool,
}

impl SlackTracker {
    pub fn new(policy: SlackPolicy) -> Self {
        Self {
            policy,
            expected_exec_cost: 0,
            slack_consumed: 0,
            running_slack: 0,
            cur_slack: 0,
            lending: false,
        }
    }

    pub fn policy(&self) -> SlackPolicy {
        self.policy
    }

    pub fn expected_exec_cost(&self) -> Time {
        self.expected_exec_cost
    }

    pub fn slack_consumed(&self) -> Time {
        self.slack_consumed
    }

    pub fn running_slack(&self) -> Time {
        self.running_slack
    }

    /// Slack as of the last reset or recompute.
    pub fn cur_slack(&self) -> Time {
        self.cur_slack
    }

    pub fn is_lending(&self) -> bool {
        self.lending
    }

    pub fn set_expected_exec_cost(&mut self, cost: Time) {
        self.expected_exec_cost = cost;
    }

    /// Start a new slot with `budget` available.  Returns the fresh slack.
    pub fn reset(&mut self, budget: Time) -> Time {
        self.running_slack = 0;
        self.slack_consumed = 0;
        self.lending = false;
        self.cur_slack = budget.saturating_sub(self.expected_exec_cost);
        self.cur_slack
    }

    /// Re-derive slack from the slot's budget counters.
    ///
    /// Never more than `budget_available`: slack is lent out of what is left
    /// of the slot, even after periodic clients departed and their cost no
    /// longer counts.
    pub fn recompute(&mut self, budget_available: Time, budget_consumed: Time) -> Time {
        let budget = budget_available + budget_consumed;
        let execution = self.expected_exec_cost + self.slack_consumed;
        self.cur_slack = budget.saturating_sub(execution).min(budget_available);
        trace!(
            budget,
            execution,
            slack = self.cur_slack,
            "slack recomputed"
        );
        self.cur_slack
    }

    /// Returns `true` if enough slack is left to lend to a best-effort client.
    pub fn can_lend(&self) -> bool {
        self.cur_slack > MIN_LENDABLE_SLACK
    }

    /// A best-effort client was dispatched.  Returns its run allowance.
    pub fn lend(&mut self) -> Time {
        self.lending = true;
        if self.policy == SlackPolicy::TickBounded {
            self.running_slack = self.cur_slack;
        }
        self.cur_slack
    }

    /// A periodic client was dispatched; stop charging time to slack.
    pub fn reclaim(&mut self) {
        self.lending = false;
        self.running_slack = 0;
    }

    /// Charge `how_much` elapsed time while lending.
    ///
    /// Under `TickBounded` returns the allowance still left, which the caller
    /// turns into a relative wake-up request (`Some(0)` means "preempt now").
    /// Returns `None` when nothing was lent or under `Cumulative`.
    pub fn charge(&mut self, how_much: Time) -> Option<Time> {
        if !self.lending {
            return None;
        }
        self.slack_consumed += how_much;

        match self.policy {
            SlackPolicy::Cumulative => None,
            SlackPolicy::TickBounded => {
                self.running_slack = self.running_slack.saturating_sub(how_much);
                if self.running_slack == 0 {
                    self.lending = false;
                }
                Some(self.running_slack)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(policy: SlackPolicy, expected: Time) -> SlackTracker {
        let mut t = SlackTracker::new(policy);
        t.set_expected_exec_cost(expected);
        t
    }

    // ── reset / recompute ─────────────────────────────────────────────────────

    #[test]
    fn reset_leaves_budget_minus_expected_cost() {
        let mut t = tracker(SlackPolicy::TickBounded, 30);
        assert_eq!(t.reset(100), 70);
        assert_eq!(t.slack_consumed(), 0);
        assert!(!t.is_lending());
    }

    #[test]
    fn reset_clamps_at_zero_when_overcommitted() {
        let mut t = tracker(SlackPolicy::TickBounded, 150);
        assert_eq!(t.reset(100), 0);
        assert!(!t.can_lend());
    }

    #[test]
    fn recompute_accounts_for_consumed_budget_and_slack() {
        let mut t = tracker(SlackPolicy::Cumulative, 30);
        t.reset(100);
        // 20 units consumed by this reservation, 80 left in the slot
        assert_eq!(t.recompute(80, 20), 70);

        // lend and burn 25 units of slack
        t.lend();
        t.charge(25);
        // 45 consumed, 55 left: 100 - (30 + 25)
        assert_eq!(t.recompute(55, 45), 45);
    }

    #[test]
    fn idle_time_erodes_slack() {
        let mut t = tracker(SlackPolicy::TickBounded, 30);
        t.reset(100);
        // 50 units passed without this reservation running
        assert_eq!(t.recompute(50, 0), 20);
    }

    #[test]
    fn slack_never_exceeds_remaining_budget() {
        let mut t = tracker(SlackPolicy::TickBounded, 40);
        t.reset(100);
        // the periodic client ran 40 units and left
        t.set_expected_exec_cost(0);
        assert_eq!(t.recompute(60, 40), 60);
    }

    #[test]
    fn threshold_requires_more_than_one_unit() {
        let mut t = tracker(SlackPolicy::TickBounded, 99);
        t.reset(100);
        assert_eq!(t.cur_slack(), 1);
        assert!(!t.can_lend());
        t.set_expected_exec_cost(98);
        t.reset(100);
        assert!(t.can_lend());
    }

    // ── TickBounded ───────────────────────────────────────────────────────────

    #[test]
    fn tick_bounded_counts_down_running_allowance() {
        let mut t = tracker(SlackPolicy::TickBounded, 60);
        t.reset(100);
        assert_eq!(t.lend(), 40);
        assert_eq!(t.running_slack(), 40);

        assert_eq!(t.charge(15), Some(25));
        assert_eq!(t.charge(25), Some(0));
        assert!(!t.is_lending());
        assert_eq!(t.slack_consumed(), 40);

        // no longer lending: further time is not slack
        assert_eq!(t.charge(10), None);
        assert_eq!(t.slack_consumed(), 40);
    }

    #[test]
    fn tick_bounded_overrun_charges_full_amount() {
        let mut t = tracker(SlackPolicy::TickBounded, 90);
        t.reset(100);
        t.lend();
        assert_eq!(t.charge(15), Some(0));
        assert_eq!(t.slack_consumed(), 15);
    }

    // ── Cumulative ────────────────────────────────────────────────────────────

    #[test]
    fn cumulative_never_requests_preemption() {
        let mut t = tracker(SlackPolicy::Cumulative, 60);
        t.reset(100);
        assert_eq!(t.lend(), 40);
        assert_eq!(t.running_slack(), 0);
        assert_eq!(t.charge(50), None);
        assert_eq!(t.slack_consumed(), 50);
        assert!(t.is_lending());
    }

    #[test]
    fn reclaim_stops_slack_charging() {
        let mut t = tracker(SlackPolicy::Cumulative, 0);
        t.reset(100);
        t.lend();
        t.reclaim();
        assert_eq!(t.charge(10), None);
        assert_eq!(t.slack_consumed(), 0);
    }

    #[test]
    fn policy_deserialises_from_snake_case() {
        let p: SlackPolicy = serde_yaml::from_str("cumulative").unwrap();
        assert_eq!(p, SlackPolicy::Cumulative);
        assert_eq!(SlackPolicy::default(), SlackPolicy::TickBounded);
    }
}
