// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tiered timeout policy for held locks
//!
//! Pure decision logic: the monitor feeds in a lock's age and the holder's
//! heartbeat liveness and gets back what to do about it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Age thresholds applied to every held lock
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutTiers {
    /// Log a warning once a lock is this old
    #[serde(with = "humantime_serde")]
    pub warning: Duration,
    /// Evict if the heartbeat is stale once a lock is this old
    #[serde(with = "humantime_serde")]
    pub soft: Duration,
    /// Evict unconditionally once a lock is this old
    #[serde(with = "humantime_serde")]
    pub hard: Duration,
}

impl Default for TimeoutTiers {
    fn default() -> Self {
        Self {
            warning: Duration::from_secs(300),
            soft: Duration::from_secs(600),
            hard: Duration::from_secs(7200),
        }
    }
}

impl TimeoutTiers {
    pub fn new(warning: Duration, soft: Duration, hard: Duration) -> Self {
        Self {
            warning,
            soft,
            hard,
        }
    }

    pub fn classify(&self, age: Duration) -> TimeoutTier {
        if age >= self.hard {
            TimeoutTier::Hard
        } else if age >= self.soft {
            TimeoutTier::Soft
        } else if age >= self.warning {
            TimeoutTier::Warning
        } else {
            TimeoutTier::Normal
        }
    }
}

/// Which threshold a lock's age has crossed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutTier {
    Normal,
    Warning,
    Soft,
    Hard,
}

impl TimeoutTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeoutTier::Normal => "normal",
            TimeoutTier::Warning => "warning",
            TimeoutTier::Soft => "soft",
            TimeoutTier::Hard => "hard",
        }
    }

    /// Whether deciding on this tier requires a heartbeat lookup
    pub fn needs_liveness(&self) -> bool {
        matches!(self, TimeoutTier::Soft)
    }
}

impl std::fmt::Display for TimeoutTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heartbeat state of a lock holder
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum Liveness {
    /// Heartbeat renewed within the timeout
    Alive {
        #[serde(with = "humantime_serde")]
        age: Duration,
    },
    /// Heartbeat present but older than the timeout
    Stale {
        #[serde(with = "humantime_serde")]
        age: Duration,
    },
    /// No heartbeat record at all
    Missing,
}

impl Liveness {
    /// Classify a heartbeat age against the configured timeout
    pub fn from_age(age: Duration, timeout: Duration) -> Self {
        if age <= timeout {
            Liveness::Alive { age }
        } else {
            Liveness::Stale { age }
        }
    }

    pub fn is_alive(&self) -> bool {
        matches!(self, Liveness::Alive { .. })
    }
}

/// What the monitor should do about a held lock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorAction {
    None,
    Warn,
    ForceRelease,
}

/// Decide the action for a lock in `tier`
///
/// `liveness` only matters in the soft tier; pass `None` when it was not
/// looked up, which counts as not alive.
pub fn decide(tier: TimeoutTier, liveness: Option<Liveness>) -> MonitorAction {
    match tier {
        TimeoutTier::Normal => MonitorAction::None,
        TimeoutTier::Warning => MonitorAction::Warn,
        TimeoutTier::Soft => match liveness {
            Some(l) if l.is_alive() => MonitorAction::None,
            _ => MonitorAction::ForceRelease,
        },
        TimeoutTier::Hard => MonitorAction::ForceRelease,
    }
}

#[cfg(test)]
#[path = "tier_tests.rs"]
mod tests;
