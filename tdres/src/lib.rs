/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! tdres – table-driven CPU reservations with slack stealing
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── table/          – interval tables & major-cycle arithmetic
//! ├── reservation/    – generic reservation model, clients, state machine
//! ├── table_driven/   – table-driven reservation, slack tracker, aperiodic queue
//! ├── env             – scheduling environment trait + manual clock
//! ├── config/         – YAML schedule files
//! └── sim/            – uniprocessor simulation environment
//! ```

pub mod config;
pub mod env;
pub mod reservation;
pub mod sim;
pub mod table;
pub mod table_driven;
