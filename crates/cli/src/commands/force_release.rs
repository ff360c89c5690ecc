// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gpulock force-release <resource>` - Remove a lock whoever holds it

use crate::context;
use crate::error::CliError;
use anyhow::Result;
use clap::Args;
use gpulock_core::Config;
use gpulock_engine::Inspector;
use std::process::ExitCode;

#[derive(Args)]
pub struct ForceReleaseArgs {
    /// Resource to release (e.g., "gpu:0")
    pub resource: String,
}

pub async fn handle(args: ForceReleaseArgs, config: Config) -> Result<ExitCode> {
    let coordinator = context::connect(&config).await?;
    let threshold = config.monitor.long_held_threshold(&config.lock.tiers);
    let inspector = Inspector::new(
        coordinator,
        config.lock.clone(),
        threshold,
        context::open_audit_log(&config)?,
    );

    let forced = inspector
        .force_release(&args.resource)
        .await
        .map_err(|e| CliError::backend_unavailable(&config.backend.url, e))?;

    match forced.previous_owner {
        Some(owner) => println!("Released {} (held by {})", forced.resource, owner),
        None => println!("{} was not held", forced.resource),
    }
    Ok(ExitCode::SUCCESS)
}
