// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock, backend and monitor configuration
//!
//! Durations are written in humantime form (`"1s"`, `"10m"`, `"2h"`).

use crate::keys::{KeySpace, DEFAULT_NAMESPACE};
use crate::tier::TimeoutTiers;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Per-acquisition settings shared by every caller of a resource
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    /// Delay before the first retry
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Cap on the delay between retries
    #[serde(with = "humantime_serde")]
    pub max_poll_interval: Duration,
    /// Give up waiting after this long
    #[serde(with = "humantime_serde")]
    pub max_wait_time: Duration,
    /// TTL of the lock record
    #[serde(with = "humantime_serde")]
    pub lock_timeout: Duration,
    /// Double the poll delay after every failed attempt
    pub exponential_backoff: bool,
    /// Race poll sleeps against release notifications
    pub notifications: bool,
    /// How often holders renew their heartbeat
    #[serde(with = "humantime_serde")]
    pub heartbeat_interval: Duration,
    /// Heartbeats older than this mark the holder as stale
    #[serde(with = "humantime_serde")]
    pub heartbeat_timeout: Duration,
    pub tiers: TimeoutTiers,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_poll_interval: Duration::from_secs(10),
            max_wait_time: Duration::from_secs(3600),
            lock_timeout: Duration::from_secs(3 * 3600),
            exponential_backoff: true,
            notifications: true,
            heartbeat_interval: Duration::from_secs(5),
            heartbeat_timeout: Duration::from_secs(20),
            tiers: TimeoutTiers::default(),
        }
    }
}

impl LockSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_poll_interval(mut self, interval: Duration) -> Self {
        self.max_poll_interval = interval;
        self
    }

    pub fn with_max_wait_time(mut self, wait: Duration) -> Self {
        self.max_wait_time = wait;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_exponential_backoff(mut self, enabled: bool) -> Self {
        self.exponential_backoff = enabled;
        self
    }

    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.notifications = enabled;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_heartbeat_timeout(mut self, timeout: Duration) -> Self {
        self.heartbeat_timeout = timeout;
        self
    }

    pub fn with_tiers(mut self, tiers: TimeoutTiers) -> Self {
        self.tiers = tiers;
        self
    }

    /// TTL of a heartbeat record; tolerates one missed renewal
    pub fn heartbeat_ttl(&self) -> Duration {
        self.heartbeat_interval * 2
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let nonzero = [
            ("poll_interval", self.poll_interval),
            ("max_poll_interval", self.max_poll_interval),
            ("lock_timeout", self.lock_timeout),
            ("heartbeat_interval", self.heartbeat_interval),
            ("heartbeat_timeout", self.heartbeat_timeout),
        ];
        for (name, value) in nonzero {
            if value.is_zero() {
                return Err(ConfigError::Invalid(format!("{} must be non-zero", name)));
            }
        }

        if self.poll_interval > self.max_poll_interval {
            return Err(ConfigError::Invalid(
                "poll_interval must not exceed max_poll_interval".to_string(),
            ));
        }
        if self.heartbeat_timeout <= self.heartbeat_interval {
            return Err(ConfigError::Invalid(
                "heartbeat_timeout must be longer than heartbeat_interval".to_string(),
            ));
        }

        let TimeoutTiers {
            warning,
            soft,
            hard,
        } = self.tiers;
        if !(warning <= soft && soft <= hard) {
            return Err(ConfigError::Invalid(format!(
                "timeout tiers must satisfy warning <= soft <= hard (got {}, {}, {})",
                humantime::format_duration(warning),
                humantime::format_duration(soft),
                humantime::format_duration(hard),
            )));
        }

        Ok(())
    }

    /// The lock TTL expires before the hard tier can ever be reached
    pub fn ttl_shorter_than_hard_tier(&self) -> bool {
        self.lock_timeout < self.tiers.hard
    }
}

/// Coordination backend connection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub namespace: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl BackendConfig {
    pub fn keys(&self) -> KeySpace {
        KeySpace::new(self.namespace.clone())
    }
}

/// Health monitor schedule and reporting
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Time between scans
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Held locks older than this are reported as long-held (defaults to the soft tier)
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub long_held_threshold: Option<Duration>,
    /// Append audit records to this file as JSON lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_log: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            long_held_threshold: None,
            audit_log: None,
        }
    }
}

impl MonitorConfig {
    pub fn long_held_threshold(&self, tiers: &TimeoutTiers) -> Duration {
        self.long_held_threshold.unwrap_or(tiers.soft)
    }
}

/// Complete configuration file
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub lock: LockSettings,
    pub monitor: MonitorConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.namespace.is_empty() {
            return Err(ConfigError::Invalid(
                "backend.namespace must not be empty".to_string(),
            ));
        }
        if self.monitor.interval.is_zero() {
            return Err(ConfigError::Invalid(
                "monitor.interval must be non-zero".to_string(),
            ));
        }
        self.lock.validate()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
