// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health report over the currently held locks

use crate::tier::{Liveness, TimeoutTier, TimeoutTiers};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the store says about one held lock
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockObservation {
    pub resource: String,
    pub owner: String,
    /// `None` when the record has no TTL and will never expire on its own
    pub age: Option<Duration>,
    pub heartbeat: Liveness,
}

impl LockObservation {
    /// A lock without a TTL counts as having reached the hard tier
    pub fn tier(&self, tiers: &TimeoutTiers) -> TimeoutTier {
        match self.age {
            Some(age) => tiers.classify(age),
            None => TimeoutTier::Hard,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeldLockClass {
    Healthy,
    /// Holder has no heartbeat record at all
    Zombie,
    /// Held longer than the long-held threshold
    LongHeld,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldLock {
    pub resource: String,
    pub owner: String,
    #[serde(with = "humantime_serde")]
    pub age: Option<Duration>,
    pub tier: TimeoutTier,
    pub heartbeat: Liveness,
    pub class: HeldLockClass,
}

impl HeldLock {
    fn classify(observation: LockObservation, tiers: &TimeoutTiers, long_held: Duration) -> Self {
        let tier = observation.tier(tiers);
        let class = if observation.heartbeat == Liveness::Missing {
            HeldLockClass::Zombie
        } else if observation.age.map_or(true, |age| age >= long_held) {
            HeldLockClass::LongHeld
        } else {
            HeldLockClass::Healthy
        };
        Self {
            resource: observation.resource,
            owner: observation.owner,
            age: observation.age,
            tier,
            heartbeat: observation.heartbeat,
            class,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    /// Held locks whose holder has no heartbeat record
    pub zombie_locks: Vec<HeldLock>,
    /// Held locks older than the long-held threshold
    pub long_held_locks: Vec<HeldLock>,
    /// Every held lock, sorted by resource
    pub held_locks: Vec<HeldLock>,
}

impl HealthReport {
    /// Classify every observation; any zombie makes the report unhealthy,
    /// otherwise any long-held lock makes it a warning
    pub fn from_locks(
        observations: Vec<LockObservation>,
        tiers: &TimeoutTiers,
        long_held_threshold: Duration,
    ) -> Self {
        let mut held_locks: Vec<HeldLock> = observations
            .into_iter()
            .map(|o| HeldLock::classify(o, tiers, long_held_threshold))
            .collect();
        held_locks.sort_by(|a, b| a.resource.cmp(&b.resource));

        let of_class = |class| -> Vec<HeldLock> {
            held_locks
                .iter()
                .filter(|l| l.class == class)
                .cloned()
                .collect()
        };
        let zombie_locks = of_class(HeldLockClass::Zombie);
        let long_held_locks = of_class(HeldLockClass::LongHeld);

        let status = if !zombie_locks.is_empty() {
            HealthStatus::Unhealthy
        } else if !long_held_locks.is_empty() {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        };

        Self {
            status,
            zombie_locks,
            long_held_locks,
            held_locks,
        }
    }
}

fn format_age(age: Option<Duration>) -> String {
    match age {
        Some(age) => humantime::format_duration(Duration::from_secs(age.as_secs())).to_string(),
        None => "no ttl".to_string(),
    }
}

impl std::fmt::Display for HealthReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "status: {} ({} held, {} zombie, {} long-held)",
            self.status,
            self.held_locks.len(),
            self.zombie_locks.len(),
            self.long_held_locks.len()
        )?;
        for lock in &self.held_locks {
            let heartbeat = match lock.heartbeat {
                Liveness::Alive { age } => format!("heartbeat {}s ago", age.as_secs()),
                Liveness::Stale { age } => format!("heartbeat stale {}s", age.as_secs()),
                Liveness::Missing => "no heartbeat".to_string(),
            };
            write!(
                f,
                "\n  {}  {}  age {}  tier {}  {}",
                lock.resource,
                lock.owner,
                format_age(lock.age),
                lock.tier,
                heartbeat
            )?;
            match lock.class {
                HeldLockClass::Zombie => f.write_str("  [zombie]")?,
                HeldLockClass::LongHeld => f.write_str("  [long-held]")?,
                HeldLockClass::Healthy => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
