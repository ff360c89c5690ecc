// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gpulock health` - Report held locks and their health

use crate::context;
use crate::error::CliError;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::Args;
use gpulock_core::{Config, HealthStatus};
use gpulock_engine::Inspector;
use std::process::ExitCode;

#[derive(Args)]
pub struct HealthArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Exits non-zero only when a zombie lock is found
pub async fn handle(args: HealthArgs, config: Config) -> Result<ExitCode> {
    let coordinator = context::connect(&config).await?;
    let threshold = config.monitor.long_held_threshold(&config.lock.tiers);
    let inspector = Inspector::new(
        coordinator,
        config.lock.clone(),
        threshold,
        context::open_audit_log(&config)?,
    );

    let report = inspector
        .health()
        .await
        .map_err(|e| CliError::backend_unavailable(&config.backend.url, e))?;
    output::print(&report, args.format);

    Ok(match report.status {
        HealthStatus::Unhealthy => ExitCode::FAILURE,
        HealthStatus::Healthy | HealthStatus::Warning => ExitCode::SUCCESS,
    })
}
