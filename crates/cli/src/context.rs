// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration loading and backend wiring shared by every command

use crate::error::CliError;
use anyhow::{Context, Result};
use gpulock_adapters::{RedisLockStore, TracedLockStore};
use gpulock_core::{AuditLog, Config, SystemClock, DEFAULT_AUDIT_CAPACITY};
use gpulock_engine::{LockCoordinator, SharedAuditLog};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub type Store = TracedLockStore<RedisLockStore>;
pub type Coordinator = LockCoordinator<Store, SystemClock>;

/// Global flags layered over the configuration file
#[derive(Debug, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub redis_url: Option<String>,
    pub namespace: Option<String>,
}

pub fn load_config(overrides: &Overrides) -> Result<Config> {
    let mut config = match &overrides.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(url) = &overrides.redis_url {
        config.backend.url = url.clone();
    }
    if let Some(namespace) = &overrides.namespace {
        config.backend.namespace = namespace.clone();
    }
    config.validate()?;

    if config.lock.ttl_shorter_than_hard_tier() {
        tracing::warn!(
            lock_timeout = %humantime::format_duration(config.lock.lock_timeout),
            hard = %humantime::format_duration(config.lock.tiers.hard),
            "lock_timeout is shorter than the hard tier, locks expire before hard eviction"
        );
    }
    Ok(config)
}

/// Connect to Redis, failing with the backend-unavailable exit code
pub async fn connect(config: &Config) -> Result<Coordinator> {
    let store = RedisLockStore::connect(&config.backend.url)
        .await
        .map_err(|e| CliError::backend_unavailable(&config.backend.url, e))?;
    Ok(LockCoordinator::new(
        TracedLockStore::new(store),
        config.backend.keys(),
        SystemClock,
    ))
}

/// The configured audit file, or an in-memory log when none is set
pub fn open_audit_log(config: &Config) -> Result<SharedAuditLog> {
    let log = match &config.monitor.audit_log {
        Some(path) => AuditLog::open(path.clone(), DEFAULT_AUDIT_CAPACITY)
            .with_context(|| format!("failed to open audit log {}", path.display()))?,
        None => AuditLog::in_memory(DEFAULT_AUDIT_CAPACITY),
    };
    Ok(Arc::new(Mutex::new(log)))
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
