/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Schedule file loading.
//!
//! A schedule file describes the table-driven reservations of one core and,
//! for simulation, the tasks attached to them.
//!
//! The expected YAML structure is:
//! ```yaml
//! time_zero: 0
//! horizon: 5000
//! share_aperiodic_queue: true
//! reservations:
//!   - id: 1
//!     priority: 1
//!     major_cycle: 500
//!     slack_policy: tick_bounded
//!     intervals: [[0, 100], [200, 300]]
//! tasks:
//!   - name: control
//!     reservation: 1
//!     class: hard
//!     exec_cost: 40
//!     period: 500
//!   - name: logger
//!     reservation: 1
//!     class: best_effort
//!     demand: 300
//! ```

pub mod error;

pub use error::ConfigError;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::reservation::{ClientId, ReservationId, TaskClass};
use crate::table::{Interval, IntervalTable, Time};
use crate::table_driven::{SharedAperiodicQueue, SlackPolicy, TableDrivenReservation};

/// Number of major cycles simulated when the file sets no horizon.
pub const DEFAULT_HORIZON_CYCLES: Time = 4;

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.
#[derive(Debug, Deserialize)]
struct ScheduleFile {
    #[serde(default)]
    time_zero: Time,
    horizon: Option<Time>,
    #[serde(default = "default_share_aperiodic_queue")]
    share_aperiodic_queue: bool,
    #[serde(default)]
    reservations: Vec<ReservationEntry>,
    #[serde(default)]
    tasks: Vec<TaskEntry>,
}

#[derive(Debug, Deserialize)]
struct ReservationEntry {
    id: u32,
    #[serde(default)]
    priority: u32,
    major_cycle: Time,
    #[serde(default)]
    slack_policy: SlackPolicy,
    intervals: Vec<(Time, Time)>,
}

#[derive(Debug, Deserialize)]
struct TaskEntry {
    name: String,
    reservation: u32,
    #[serde(default)]
    class: TaskClass,
    #[serde(default)]
    exec_cost: Time,
    #[serde(default)]
    period: Time,
    #[serde(default)]
    demand: Time,
    #[serde(default)]
    phase: Time,
}

/// Reservations of one core share a best-effort queue unless told otherwise.
fn default_share_aperiodic_queue() -> bool {
    true
}

// ── Public data structures ────────────────────────────────────────────────────

/// One validated table-driven reservation.
#[derive(Debug, Clone)]
pub struct ReservationConfig {
    pub id: ReservationId,
    /// Lower value = higher priority.
    pub priority: u32,
    pub slack_policy: SlackPolicy,
    pub table: Arc<IntervalTable>,
}

impl ReservationConfig {
    /// Instantiate the reservation on top of `queue`.
    pub fn build(&self, queue: SharedAperiodicQueue) -> TableDrivenReservation {
        TableDrivenReservation::new(
            self.id,
            self.priority,
            Arc::clone(&self.table),
            self.slack_policy,
            queue,
        )
    }
}

/// One task attached to a reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskConfig {
    /// Assigned in file order, starting at 1.
    pub id: ClientId,
    pub name: String,
    pub reservation: ReservationId,
    pub class: TaskClass,
    /// Per-job execution cost (periodic classes).
    pub exec_cost: Time,
    /// Release period (periodic classes).
    pub period: Time,
    /// Total execution demand (best-effort class).
    pub demand: Time,
    /// First release, relative to `time_zero`.
    pub phase: Time,
}

/// A fully validated schedule.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub time_zero: Time,
    /// Length of the simulated run, starting at `time_zero`.
    pub horizon: Time,
    pub share_aperiodic_queue: bool,
    pub reservations: Vec<ReservationConfig>,
    pub tasks: Vec<TaskConfig>,
}

impl ScheduleConfig {
    /// Read and validate the schedule file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// describes an invalid schedule (see [`ConfigError`]).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading schedule from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open schedule file: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid schedule file: {}", path.display()))
    }

    /// Parse and validate a schedule from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: ScheduleFile =
            serde_yaml::from_str(content).context("Failed to parse schedule YAML")?;
        let config = Self::from_file(file)?;

        info!(
            reservations = config.reservations.len(),
            tasks = config.tasks.len(),
            horizon = config.horizon,
            shared_queue = config.share_aperiodic_queue,
            "Schedule loaded"
        );
        Ok(config)
    }

    fn from_file(file: ScheduleFile) -> Result<Self, ConfigError> {
        if file.reservations.is_empty() {
            return Err(ConfigError::NoReservations);
        }

        let mut seen = HashSet::new();
        let mut reservations = Vec::with_capacity(file.reservations.len());
        for entry in file.reservations {
            if !seen.insert(entry.id) {
                return Err(ConfigError::DuplicateReservation(entry.id));
            }
            let intervals = entry.intervals.into_iter().map(Interval::from).collect();
            let table = IntervalTable::new(entry.major_cycle, intervals).map_err(|source| {
                ConfigError::InvalidTable {
                    id: entry.id,
                    source,
                }
            })?;

            debug!(
                "  Reservation: {} | priority: {} | cycle: {} | slots: {} | utilization: {:.1}%",
                entry.id,
                entry.priority,
                table.major_cycle(),
                table.len(),
                table.utilization() * 100.0,
            );

            reservations.push(ReservationConfig {
                id: ReservationId(entry.id),
                priority: entry.priority,
                slack_policy: entry.slack_policy,
                table: Arc::new(table),
            });
        }

        let mut names = HashSet::new();
        let mut tasks = Vec::with_capacity(file.tasks.len());
        for (index, entry) in file.tasks.into_iter().enumerate() {
            if !seen.contains(&entry.reservation) {
                return Err(ConfigError::UnknownReservation {
                    task: entry.name,
                    reservation: entry.reservation,
                });
            }
            if !names.insert(entry.name.clone()) {
                return Err(ConfigError::DuplicateTask(entry.name));
            }

            if entry.class.is_aperiodic() {
                if entry.demand == 0 {
                    warn!(task = %entry.name, "best-effort task has no demand and will never run");
                }
            } else {
                if entry.period == 0 {
                    return Err(ConfigError::ZeroPeriod { task: entry.name });
                }
                if entry.exec_cost == 0 {
                    warn!(task = %entry.name, "periodic task declares zero execution cost");
                }
                if entry.exec_cost > entry.period {
                    warn!(
                        task = %entry.name,
                        exec_cost = entry.exec_cost,
                        period = entry.period,
                        "execution cost exceeds period; every job will miss"
                    );
                }
            }

            tasks.push(TaskConfig {
                id: ClientId(index as u32 + 1),
                name: entry.name,
                reservation: ReservationId(entry.reservation),
                class: entry.class,
                exec_cost: entry.exec_cost,
                period: entry.period,
                demand: entry.demand,
                phase: entry.phase,
            });
        }

        let horizon = file.horizon.unwrap_or_else(|| {
            let longest = reservations
                .iter()
                .map(|r| r.table.major_cycle())
                .max()
                .unwrap_or(0);
            longest * DEFAULT_HORIZON_CYCLES
        });

        Ok(Self {
            time_zero: file.time_zero,
            horizon,
            share_aperiodic_queue: file.share_aperiodic_queue,
            reservations,
            tasks,
        })
    }

    /// Look up a reservation by id.
    pub fn reservation(&self, id: ReservationId) -> Option<&ReservationConfig> {
        self.reservations.iter().find(|r| r.id == id)
    }

    /// Look up a task by name.
    pub fn task(&self, name: &str) -> Option<&TaskConfig> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    const EXAMPLE: &str = r#"
time_zero: 0
horizon: 5000
reservations:
  - id: 1
    priority: 1
    major_cycle: 500
    slack_policy: cumulative
    intervals: [[0, 100], [200, 300]]
  - id: 2
    major_cycle: 1000
    intervals: [[300, 500]]
tasks:
  - name: control
    reservation: 1
    class: hard
    exec_cost: 40
    period: 500
  - name: logger
    reservation: 2
    class: best_effort
    demand: 300
    phase: 50
"#;

    // ── load_from_file ────────────────────────────────────────────────────────

    #[test]
    fn load_example_yaml() {
        let f = yaml_tempfile(EXAMPLE);
        let cfg = ScheduleConfig::load_from_file(f.path()).unwrap();

        assert_eq!(cfg.horizon, 5_000);
        assert!(cfg.share_aperiodic_queue);
        assert_eq!(cfg.reservations.len(), 2);

        let r1 = cfg.reservation(ReservationId(1)).unwrap();
        assert_eq!(r1.priority, 1);
        assert_eq!(r1.slack_policy, SlackPolicy::Cumulative);
        assert_eq!(r1.table.major_cycle(), 500);
        assert_eq!(r1.table.slot(1), Interval::new(200, 300));

        let r2 = cfg.reservation(ReservationId(2)).unwrap();
        assert_eq!(r2.priority, 0);
        assert_eq!(r2.slack_policy, SlackPolicy::TickBounded);

        let control = cfg.task("control").unwrap();
        assert_eq!(control.id, ClientId(1));
        assert_eq!(control.class, TaskClass::Hard);
        assert_eq!(control.period, 500);

        let logger = cfg.task("logger").unwrap();
        assert_eq!(logger.id, ClientId(2));
        assert_eq!(logger.reservation, ReservationId(2));
        assert_eq!(logger.demand, 300);
        assert_eq!(logger.phase, 50);
    }

    #[test]
    fn horizon_defaults_to_four_longest_cycles() {
        let yaml = r#"
reservations:
  - id: 1
    major_cycle: 500
    intervals: [[0, 100]]
  - id: 2
    major_cycle: 1200
    intervals: [[0, 100]]
"#;
        let cfg = ScheduleConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.horizon, 4_800);
        assert!(cfg.tasks.is_empty());
    }

    #[test]
    fn private_queues_can_be_requested() {
        let yaml = r#"
share_aperiodic_queue: false
reservations:
  - id: 1
    major_cycle: 100
    intervals: [[0, 50]]
"#;
        let cfg = ScheduleConfig::from_yaml_str(yaml).unwrap();
        assert!(!cfg.share_aperiodic_queue);
    }

    #[test]
    fn build_creates_inactive_reservation() {
        use crate::reservation::{Reservation, ReservationState};
        use crate::table_driven::AperiodicQueue;

        let cfg = ScheduleConfig::from_yaml_str(EXAMPLE).unwrap();
        let res = cfg.reservations[0].build(AperiodicQueue::shared());
        assert_eq!(res.id(), ReservationId(1));
        assert_eq!(res.state(), ReservationState::Inactive);
        assert_eq!(res.slack().policy(), SlackPolicy::Cumulative);
    }

    // ── rejected files ────────────────────────────────────────────────────────

    fn config_error(yaml: &str) -> ConfigError {
        let err = ScheduleConfig::from_yaml_str(yaml).unwrap_err();
        err.downcast::<ConfigError>()
            .expect("expected a semantic ConfigError")
    }

    #[test]
    fn missing_file_returns_error() {
        let result = ScheduleConfig::load_from_file(Path::new("/nonexistent/schedule.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        assert!(ScheduleConfig::load_from_file(f.path()).is_err());
    }

    #[test]
    fn no_reservations_rejected() {
        assert!(matches!(
            config_error("reservations: []\n"),
            ConfigError::NoReservations
        ));
    }

    #[test]
    fn overlapping_table_rejected_with_reservation_id() {
        let yaml = r#"
reservations:
  - id: 7
    major_cycle: 500
    intervals: [[0, 100], [50, 150]]
"#;
        let err = config_error(yaml);
        assert!(matches!(
            err,
            ConfigError::InvalidTable {
                id: 7,
                source: crate::table::TableError::Overlap { .. }
            }
        ));
    }

    #[test]
    fn duplicate_reservation_rejected() {
        let yaml = r#"
reservations:
  - id: 1
    major_cycle: 100
    intervals: [[0, 10]]
  - id: 1
    major_cycle: 100
    intervals: [[20, 30]]
"#;
        assert!(matches!(
            config_error(yaml),
            ConfigError::DuplicateReservation(1)
        ));
    }

    #[test]
    fn task_with_unknown_reservation_rejected() {
        let yaml = r#"
reservations:
  - id: 1
    major_cycle: 100
    intervals: [[0, 10]]
tasks:
  - name: orphan
    reservation: 3
    period: 100
    exec_cost: 5
"#;
        let err = config_error(yaml);
        assert!(matches!(
            err,
            ConfigError::UnknownReservation { reservation: 3, .. }
        ));
    }

    #[test]
    fn periodic_task_without_period_rejected() {
        let yaml = r#"
reservations:
  - id: 1
    major_cycle: 100
    intervals: [[0, 10]]
tasks:
  - name: control
    reservation: 1
    class: soft
    exec_cost: 5
"#;
        assert!(matches!(
            config_error(yaml),
            ConfigError::ZeroPeriod { .. }
        ));
    }

    #[test]
    fn duplicate_task_name_rejected() {
        let yaml = r#"
reservations:
  - id: 1
    major_cycle: 100
    intervals: [[0, 10]]
tasks:
  - name: a
    reservation: 1
    class: best_effort
    demand: 5
  - name: a
    reservation: 1
    class: best_effort
    demand: 5
"#;
        assert!(matches!(config_error(yaml), ConfigError::DuplicateTask(_)));
    }
}
