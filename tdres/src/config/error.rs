/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Semantic errors in a schedule file.
//!
//! Syntax and I/O problems are reported through `anyhow` by
//! [`ScheduleConfig::load_from_file`](super::ScheduleConfig::load_from_file);
//! these variants cover files that parse but describe an invalid schedule.

use thiserror::Error;

use crate::table::TableError;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file declares no reservation at all.
    #[error("schedule declares no reservations")]
    NoReservations,

    /// Two reservations share an id.
    #[error("reservation id {0} is declared more than once")]
    DuplicateReservation(u32),

    /// A reservation's slot table failed validation.
    #[error("reservation {id}: invalid interval table: {source}")]
    InvalidTable {
        id: u32,
        #[source]
        source: TableError,
    },

    /// A task names a reservation that does not exist.
    #[error("task '{task}' refers to unknown reservation {reservation}")]
    UnknownReservation { task: String, reservation: u32 },

    /// Two tasks share a name.
    #[error("task name '{0}' is used more than once")]
    DuplicateTask(String),

    /// A periodic (`hard` / `soft`) task without a period.
    #[error("periodic task '{task}' must declare a non-zero period")]
    ZeroPeriod { task: String },
}
