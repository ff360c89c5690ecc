// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! gpulock - exclusive GPU locks coordinated through Redis

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod context;
mod error;
mod logging;
mod output;

use clap::{Parser, Subcommand};
use commands::{force_release, health, monitor, run};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::context::Overrides;
use crate::error::CliError;

#[derive(Parser)]
#[command(
    name = "gpulock",
    version,
    about = "Exclusive GPU locks coordinated through Redis"
)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, env = "GPULOCK_CONFIG")]
    config: Option<PathBuf>,

    /// Redis URL, overrides the configuration file
    #[arg(long, global = true, env = "GPULOCK_REDIS_URL")]
    redis_url: Option<String>,

    /// Key namespace, overrides the configuration file
    #[arg(long, global = true)]
    namespace: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command while holding a resource lock
    Run(run::RunArgs),
    /// Scan held locks and evict stuck holders
    Monitor(monitor::MonitorArgs),
    /// Report held locks and their health
    Health(health::HealthArgs),
    /// Remove a lock whoever holds it
    ForceRelease(force_release::ForceReleaseArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Monitor(args) => args.log_file.as_deref(),
        _ => None,
    };
    let _log_guard = match logging::init(log_file) {
        Ok(guard) => guard,
        Err(e) => return report(e),
    };

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => report(e),
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<ExitCode> {
    let overrides = Overrides {
        config: cli.config,
        redis_url: cli.redis_url,
        namespace: cli.namespace,
    };
    let config = context::load_config(&overrides)?;

    match cli.command {
        Commands::Run(args) => run::handle(args, config).await,
        Commands::Monitor(args) => monitor::handle(args, config).await,
        Commands::Health(args) => health::handle(args, config).await,
        Commands::ForceRelease(args) => force_release::handle(args, config).await,
    }
}

fn report(e: anyhow::Error) -> ExitCode {
    match e.downcast_ref::<CliError>() {
        Some(cli_error) => {
            eprint!("{}", cli_error);
            ExitCode::from(cli_error.exit_code)
        }
        None => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
