// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gpulock monitor` - Scan held locks and evict stuck holders

use crate::context;
use crate::error::CliError;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::Args;
use gpulock_core::{Config, StatsSnapshot};
use gpulock_engine::{HealthMonitor, ScanReport};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

#[derive(Args)]
pub struct MonitorArgs {
    /// Run a single scan, print the report and exit
    #[arg(long)]
    pub once: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Result of `monitor --once`
#[derive(Serialize)]
struct SingleScan {
    scan: ScanReport,
    stats: StatsSnapshot,
}

impl std::fmt::Display for SingleScan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.scan)?;
        write!(f, "{}", self.stats)
    }
}

pub async fn handle(args: MonitorArgs, config: Config) -> Result<ExitCode> {
    let coordinator = context::connect(&config).await?;
    let mut monitor = HealthMonitor::new(
        coordinator.clone(),
        config.lock.clone(),
        config.monitor.interval,
        context::open_audit_log(&config)?,
    );

    if args.once {
        let scan = monitor
            .scan_once()
            .await
            .map_err(|e| CliError::backend_unavailable(&config.backend.url, e))?;
        let single = SingleScan {
            scan,
            stats: coordinator.stats().snapshot(),
        };
        output::print(&single, args.format);
        return Ok(ExitCode::SUCCESS);
    }

    let shutdown = CancellationToken::new();
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
            }
            shutdown.cancel();
        }
    });

    monitor.run(shutdown).await;
    let stats = coordinator.stats().snapshot();
    tracing::info!(
        forced_releases = stats.forced_releases,
        warnings = stats.warnings,
        "monitor exited"
    );
    Ok(ExitCode::SUCCESS)
}
