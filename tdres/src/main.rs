/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use tdres::config::ScheduleConfig;
use tdres::sim::{SimReport, Simulator};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Simulate table-driven reservations on one core.
///
/// Example:
///   tdres -s schedule.yaml -H 10000 -r report.yaml
#[derive(Debug, Parser)]
#[command(
    name = "tdres",
    about = "Table-driven CPU reservation simulator",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML schedule file.
    #[arg(short = 's', long = "schedule")]
    schedule: PathBuf,

    /// Override the simulated horizon (time units after `time_zero`).
    #[arg(short = 'H', long = "horizon")]
    horizon: Option<u64>,

    /// Write the full simulation report to this YAML file.
    #[arg(short = 'r', long = "report")]
    report: Option<PathBuf>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!(
        schedule = %cli.schedule.display(),
        horizon  = ?cli.horizon,
        report   = ?cli.report,
        "Configuration"
    );

    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = ScheduleConfig::load_from_file(&cli.schedule)?;
    if let Some(horizon) = cli.horizon {
        config.horizon = horizon;
    }
    if config.tasks.is_empty() {
        warn!("Schedule declares no tasks; reservations will stay inactive");
    }

    let report = Simulator::new(&config)?.run();
    print_summary(&report);

    if let Some(path) = &cli.report {
        let yaml = serde_yaml::to_string(&report).context("Failed to serialise report")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Cannot write report to {}", path.display()))?;
        info!("Report written to {}", path.display());
    }
    Ok(())
}

fn print_summary(report: &SimReport) {
    info!(
        "Simulated [{}, {}): {} segment(s), utilization {:.1}%",
        report.start,
        report.end,
        report.segments.len(),
        report.utilization() * 100.0,
    );
    for res in &report.reservations {
        info!(
            "  [res#{id}]  priority={prio}  consumed={used}  replenishments={rep}  final={state}",
            id = res.id,
            prio = res.priority,
            used = res.consumed,
            rep = res.replenishments,
            state = res.final_state,
        );
    }
    for task in &report.tasks {
        let line = format!(
            "  [{name}]  class={class}  executed={exec}  jobs={done}/{rel}  misses={miss}",
            name = task.name,
            class = task.class,
            exec = task.executed,
            done = task.jobs_completed,
            rel = task.jobs_released,
            miss = task.deadline_misses,
        );
        if task.deadline_misses > 0 {
            warn!("{line}");
        } else {
            info!("{line}");
        }
    }
}
