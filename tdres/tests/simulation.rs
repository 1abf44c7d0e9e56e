/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! End-to-end runs: schedule file on disk → simulator → report.

use std::io::Write;

use tdres::config::ScheduleConfig;
use tdres::reservation::ReservationId;
use tdres::sim::{SimReport, Simulator};
use tempfile::NamedTempFile;

/// Two reservations interleaved on a 400-unit cycle, anchored at t = 1000,
/// sharing one best-effort queue.
const INTERLEAVED: &str = r#"
time_zero: 1000
horizon: 4000
reservations:
  - id: 1
    priority: 0
    major_cycle: 400
    slack_policy: tick_bounded
    intervals: [[0, 100], [200, 300]]
  - id: 2
    priority: 1
    major_cycle: 400
    slack_policy: cumulative
    intervals: [[100, 200], [300, 400]]
tasks:
  - name: a
    reservation: 1
    class: hard
    exec_cost: 60
    period: 400
    phase: 350
  - name: b
    reservation: 2
    class: soft
    exec_cost: 30
    period: 200
    phase: 350
  - name: bg
    reservation: 2
    class: best_effort
    demand: 500
"#;

fn write_schedule(content: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f
}

fn simulate(content: &str) -> SimReport {
    let file = write_schedule(content);
    let config = ScheduleConfig::load_from_file(file.path()).unwrap();
    Simulator::new(&config).unwrap().run()
}

fn slots_of(res: u32) -> &'static [(u64, u64)] {
    match res {
        1 => &[(0, 100), (200, 300)],
        2 => &[(100, 200), (300, 400)],
        _ => &[],
    }
}

#[test]
fn processor_runs_one_segment_at_a_time() {
    let report = simulate(INTERLEAVED);
    assert!(!report.segments.is_empty());
    for pair in report.segments.windows(2) {
        assert!(
            pair[0].end <= pair[1].start,
            "overlapping segments: {:?} / {:?}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn every_segment_stays_inside_its_reservation_slots() {
    let report = simulate(INTERLEAVED);
    for seg in &report.segments {
        let offset = (seg.start - 1_000) % 400;
        let end = offset + seg.duration();
        let inside = slots_of(seg.reservation)
            .iter()
            .any(|&(s, e)| s <= offset && end <= e);
        assert!(inside, "segment {seg:?} escapes reservation {}", seg.reservation);
    }
}

#[test]
fn consumption_matches_executed_time() {
    let report = simulate(INTERLEAVED);

    for res in &report.reservations {
        let from_segments: u64 = report
            .segments
            .iter()
            .filter(|s| s.reservation == res.id)
            .map(|s| s.duration())
            .sum();
        assert_eq!(res.consumed, from_segments, "reservation {}", res.id);
    }

    let executed: u64 = report.tasks.iter().map(|t| t.executed).sum();
    assert_eq!(executed, report.busy_time());
}

#[test]
fn shared_best_effort_work_runs_in_both_reservations() {
    let report = simulate(INTERLEAVED);
    let bg = report.task("bg").unwrap();
    assert_eq!(bg.executed, 500);
    assert_eq!(bg.jobs_completed, 1);

    let mut lenders: Vec<u32> = report.segments_of("bg").map(|s| s.reservation).collect();
    lenders.sort_unstable();
    lenders.dedup();
    assert_eq!(lenders, vec![1, 2]);
}

#[test]
fn hard_task_completes_every_job_it_releases() {
    let report = simulate(INTERLEAVED);
    let a = report.task("a").unwrap();
    assert_eq!(a.deadline_misses, 0);
    assert!(a.jobs_released >= 9);
    assert!(a.jobs_completed + 1 >= a.jobs_released);
    assert!(a.executed >= 60 * a.jobs_completed);
}

#[test]
fn runs_are_deterministic() {
    assert_eq!(simulate(INTERLEAVED), simulate(INTERLEAVED));
}

#[test]
fn horizon_can_be_overridden_after_loading() {
    let file = write_schedule(INTERLEAVED);
    let mut config = ScheduleConfig::load_from_file(file.path()).unwrap();
    config.horizon = 400;
    let report = Simulator::new(&config).unwrap().run();
    assert_eq!((report.start, report.end), (1_000, 1_400));
    // nothing runs before the first full cycle; the end step still replenishes
    assert!(report.segments.is_empty());
    assert_eq!(report.reservation(ReservationId(1)).unwrap().replenishments, 1);
    assert_eq!(report.reservation(ReservationId(2)).unwrap().replenishments, 0);
}

#[test]
fn report_serialises_to_yaml() {
    let report = simulate(INTERLEAVED);
    let yaml = serde_yaml::to_string(&report).unwrap();
    let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

    assert!(value["segments"].as_sequence().is_some_and(|s| !s.is_empty()));
    assert_eq!(value["tasks"][2]["class"].as_str(), Some("best_effort"));
    let state = value["reservations"][0]["final_state"].as_str().unwrap();
    assert!(
        ["ACTIVE", "ACTIVE_IDLE", "DEPLETED"].contains(&state),
        "unexpected state {state}"
    );
}

#[test]
fn invalid_schedule_is_reported_with_file_context() {
    let file = write_schedule(
        r#"
reservations:
  - id: 1
    major_cycle: 100
    intervals: [[50, 150]]
"#,
    );
    let err = ScheduleConfig::load_from_file(file.path()).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("Invalid schedule file"), "{msg}");
    assert!(msg.contains("past the major cycle"), "{msg}");
}
