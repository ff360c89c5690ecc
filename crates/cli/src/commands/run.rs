// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gpulock run <resource> -- <cmd>...` - Run a command under an exclusive lock

use crate::context;
use crate::error::CliError;
use anyhow::{Context, Result};
use clap::Args;
use gpulock_core::Config;
use gpulock_engine::LockError;
use std::process::{ExitCode, ExitStatus};
use std::time::Duration;
use tokio::process::Command;

#[derive(Args)]
pub struct RunArgs {
    /// Resource to lock (e.g., "gpu:0")
    pub resource: String,

    /// Give up after waiting this long (e.g., "30s", "2h")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub max_wait: Option<Duration>,

    /// Print lock statistics to stderr when done
    #[arg(long)]
    pub stats: bool,

    /// Command to run while the lock is held
    #[arg(last = true, required = true, num_args = 1..)]
    pub command: Vec<String>,
}

pub async fn handle(args: RunArgs, config: Config) -> Result<ExitCode> {
    let coordinator = context::connect(&config).await?;

    let mut settings = config.lock.clone();
    if let Some(max_wait) = args.max_wait {
        settings = settings.with_max_wait_time(max_wait);
    }

    let (program, program_args) = args
        .command
        .split_first()
        .context("no command given")?;

    let result = coordinator
        .with_exclusive_resource(&args.resource, &settings, || async {
            Command::new(program).args(program_args).status().await
        })
        .await;

    if args.stats {
        eprintln!("{}", coordinator.stats().snapshot());
    }

    match result {
        Ok(status) => {
            let status = status.with_context(|| format!("failed to run {}", program))?;
            Ok(exit_code(status))
        }
        Err(LockError::Unavailable(unavailable)) => {
            Err(CliError::lock_unavailable(&unavailable).into())
        }
        Err(LockError::BackendUnavailable { source, .. }) => {
            Err(CliError::backend_unavailable(&config.backend.url, source).into())
        }
    }
}

/// The child's exit code, or 128 + signal when it was killed
fn exit_code(status: ExitStatus) -> ExitCode {
    if let Some(code) = status.code() {
        return ExitCode::from(code.clamp(0, 255) as u8);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ExitCode::from((128 + signal).clamp(0, 255) as u8);
        }
    }
    ExitCode::FAILURE
}
