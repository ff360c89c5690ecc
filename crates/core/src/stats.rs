// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-local lock statistics
//!
//! Counters are fed by the coordinator and the health monitor and read by
//! operators. Nothing here is persisted; a restart starts from zero.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct Counters {
    attempts: AtomicU64,
    successes: AtomicU64,
    timeouts: AtomicU64,
    backend_failures: AtomicU64,
    release_attempts: AtomicU64,
    releases: AtomicU64,
    emergency_releases: AtomicU64,
    ownership_violations: AtomicU64,
    script_errors: AtomicU64,
    forced_releases: AtomicU64,
    heartbeat_failures: AtomicU64,
    warnings: AtomicU64,
    total_wait_ms: AtomicU64,
    max_wait_ms: AtomicU64,
}

/// Shared handle to the lock counters
#[derive(Clone, Debug, Default)]
pub struct StatsRegistry {
    counters: Arc<Counters>,
}

impl StatsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&self) {
        self.counters.attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Acquisition succeeded after waiting `waited`
    pub fn record_success(&self, waited: Duration) {
        let ms = waited.as_millis() as u64;
        self.counters.successes.fetch_add(1, Ordering::Relaxed);
        self.counters.total_wait_ms.fetch_add(ms, Ordering::Relaxed);
        self.counters.max_wait_ms.fetch_max(ms, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.counters.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backend_failure(&self) {
        self.counters.backend_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_release_attempt(&self) {
        self.counters.release_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_release(&self) {
        self.counters.releases.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_emergency_release(&self) {
        self.counters
            .emergency_releases
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ownership_violation(&self) {
        self.counters
            .ownership_violations
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_script_error(&self) {
        self.counters.script_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_forced_release(&self) {
        self.counters.forced_releases.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_heartbeat_failure(&self) {
        self.counters
            .heartbeat_failures
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_warning(&self) {
        self.counters.warnings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let c = &self.counters;
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);

        let attempts = load(&c.attempts);
        let successes = load(&c.successes);
        let timeouts = load(&c.timeouts);
        let release_attempts = load(&c.release_attempts);
        let emergency_releases = load(&c.emergency_releases);
        let ownership_violations = load(&c.ownership_violations);
        let total_wait_ms = load(&c.total_wait_ms);

        StatsSnapshot {
            attempts,
            successes,
            timeouts,
            backend_failures: load(&c.backend_failures),
            release_attempts,
            releases: load(&c.releases),
            emergency_releases,
            ownership_violations,
            script_errors: load(&c.script_errors),
            forced_releases: load(&c.forced_releases),
            heartbeat_failures: load(&c.heartbeat_failures),
            warnings: load(&c.warnings),
            max_wait_ms: load(&c.max_wait_ms),
            success_rate: ratio(successes, attempts),
            timeout_rate: ratio(timeouts, attempts),
            emergency_release_rate: ratio(emergency_releases, successes),
            ownership_violation_rate: ratio(ownership_violations, release_attempts),
            average_wait_ms: ratio(total_wait_ms, successes),
        }
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Point-in-time copy of the counters plus derived rates
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub attempts: u64,
    pub successes: u64,
    pub timeouts: u64,
    pub backend_failures: u64,
    pub release_attempts: u64,
    pub releases: u64,
    pub emergency_releases: u64,
    pub ownership_violations: u64,
    pub script_errors: u64,
    pub forced_releases: u64,
    pub heartbeat_failures: u64,
    pub warnings: u64,
    pub max_wait_ms: u64,
    pub success_rate: f64,
    pub timeout_rate: f64,
    pub emergency_release_rate: f64,
    pub ownership_violation_rate: f64,
    pub average_wait_ms: f64,
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "acquire:  {} attempts, {} acquired ({:.1}%), {} timed out ({:.1}%), {} backend failures",
            self.attempts,
            self.successes,
            self.success_rate * 100.0,
            self.timeouts,
            self.timeout_rate * 100.0,
            self.backend_failures,
        )?;
        writeln!(
            f,
            "wait:     avg {:.0}ms, max {}ms",
            self.average_wait_ms, self.max_wait_ms
        )?;
        writeln!(
            f,
            "release:  {} ok of {}, {} emergency ({:.1}%), {} ownership violations ({:.1}%), {} script errors",
            self.releases,
            self.release_attempts,
            self.emergency_releases,
            self.emergency_release_rate * 100.0,
            self.ownership_violations,
            self.ownership_violation_rate * 100.0,
            self.script_errors,
        )?;
        write!(
            f,
            "monitor:  {} forced releases, {} warnings, {} heartbeat write failures",
            self.forced_releases, self.warnings, self.heartbeat_failures
        )
    }
}
