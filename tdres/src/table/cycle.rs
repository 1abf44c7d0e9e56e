/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Pure major-cycle arithmetic.
//!
//! Free functions shared by every reservation kind.  All times are absolute
//! and unsigned; division is floor division.  No wraparound handling is
//! provided; times must stay within `u64` for the deployment horizon.

use super::Time;

/// Start of the major cycle that contains `now`.
///
/// The cycle grid is anchored at `epoch`: cycle `k` starts at
/// `epoch + k * major_cycle`.  A `now` before the epoch is treated as lying in
/// cycle 0.
///
/// This is deliberately not the unanchored `floor(now / major_cycle) *
/// major_cycle`: with a non-zero epoch the two disagree, and every slot is
/// placed on the epoch grid.
pub fn current_cycle_start(now: Time, epoch: Time, major_cycle: Time) -> Time {
    debug_assert!(major_cycle > 0, "major cycle must be positive");
    let elapsed = now.saturating_sub(epoch);
    epoch + (elapsed / major_cycle) * major_cycle
}

/// Start of the major cycle following the one that contains `now`.
pub fn next_cycle_start(now: Time, epoch: Time, major_cycle: Time) -> Time {
    current_cycle_start(now, epoch, major_cycle) + major_cycle
}

/// Time left until `slot_end`, or `0` once `now` has reached it.
pub fn time_remaining_in_slot(now: Time, slot_end: Time) -> Time {
    slot_end.saturating_sub(now)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── current_cycle_start / next_cycle_start ────────────────────────────────

    #[test]
    fn cycle_start_mid_cycle() {
        assert_eq!(current_cycle_start(2_500, 0, 1_000), 2_000);
        assert_eq!(next_cycle_start(2_500, 0, 1_000), 3_000);
    }

    #[test]
    fn cycle_start_exactly_on_boundary() {
        // A boundary instant belongs to the cycle it opens
        assert_eq!(current_cycle_start(3_000, 0, 1_000), 3_000);
        assert_eq!(next_cycle_start(3_000, 0, 1_000), 4_000);
    }

    #[test]
    fn cycle_start_in_first_cycle() {
        assert_eq!(current_cycle_start(0, 0, 500), 0);
        assert_eq!(current_cycle_start(499, 0, 500), 0);
        assert_eq!(next_cycle_start(0, 0, 500), 500);
    }

    #[test]
    fn cycle_grid_is_anchored_at_epoch() {
        // epoch 100, cycle 1000 → cycles start at 100, 1100, 2100, ...
        assert_eq!(current_cycle_start(2_500, 100, 1_000), 2_100);
        assert_eq!(next_cycle_start(2_500, 100, 1_000), 3_100);
    }

    #[test]
    fn non_zero_epoch_differs_from_unanchored_grid() {
        let (now, epoch, mc) = (2_500, 300, 1_000);
        assert_eq!(current_cycle_start(now, epoch, mc), 2_300);
        assert_ne!(current_cycle_start(now, epoch, mc), (now / mc) * mc);
        // zero epoch: both grids coincide
        assert_eq!(current_cycle_start(now, 0, mc), (now / mc) * mc);
    }

    #[test]
    fn now_before_epoch_is_cycle_zero() {
        assert_eq!(current_cycle_start(50, 100, 1_000), 100);
        assert_eq!(next_cycle_start(50, 100, 1_000), 1_100);
    }

    // ── time_remaining_in_slot ────────────────────────────────────────────────

    #[test]
    fn remaining_counts_down_to_zero() {
        assert_eq!(time_remaining_in_slot(200, 300), 100);
        assert_eq!(time_remaining_in_slot(299, 300), 1);
        assert_eq!(time_remaining_in_slot(300, 300), 0);
    }

    #[test]
    fn remaining_never_negative_past_slot_end() {
        assert_eq!(time_remaining_in_slot(301, 300), 0);
        assert_eq!(time_remaining_in_slot(u64::MAX, 0), 0);
    }
}
