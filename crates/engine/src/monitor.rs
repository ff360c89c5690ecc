// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health monitor: tiered eviction of stuck lock holders
//!
//! Each scan walks every lock key in the namespace, classifies its age into
//! a timeout tier and applies `gpulock_core::decide`. The soft tier consults
//! the holder's heartbeat; the hard tier evicts unconditionally. Evicted
//! holders are not signalled; their own release later fails the ownership
//! check.

use crate::coordinator::LockCoordinator;
use gpulock_adapters::{LockStore, StoreError};
use gpulock_core::{
    decide, AuditAction, AuditEntry, AuditLog, Clock, LockSettings, MonitorAction, TimeoutTier,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Audit log shared between the monitor and the operator surface
pub type SharedAuditLog = Arc<Mutex<AuditLog>>;

/// Append to a shared audit log, logging (not raising) write failures
pub(crate) fn record_audit(audit: &SharedAuditLog, entry: AuditEntry) {
    let mut log = audit.lock().unwrap_or_else(|e| e.into_inner());
    if let Err(e) = log.append(entry) {
        tracing::warn!(error = %e, "failed to write audit record");
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Eviction {
    pub resource: String,
    pub previous_owner: Option<String>,
    pub tier: TimeoutTier,
    pub age_secs: Option<u64>,
}

/// Outcome of one monitor pass
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Lock keys found in the namespace
    pub scanned: usize,
    /// Locks still held when inspected
    pub held: usize,
    /// Resources newly warned about in this pass
    pub warned: Vec<String>,
    pub evicted: Vec<Eviction>,
    /// Keys that could not be inspected
    pub errors: usize,
}

impl std::fmt::Display for ScanReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "scanned {} locks: {} held, {} warned, {} evicted, {} errors",
            self.scanned,
            self.held,
            self.warned.len(),
            self.evicted.len(),
            self.errors
        )?;
        for eviction in &self.evicted {
            write!(
                f,
                "\n  evicted {} from {} ({} tier)",
                eviction.resource,
                eviction.previous_owner.as_deref().unwrap_or("-"),
                eviction.tier
            )?;
        }
        Ok(())
    }
}

pub struct HealthMonitor<S: LockStore, C: Clock> {
    coordinator: LockCoordinator<S, C>,
    settings: LockSettings,
    interval: Duration,
    audit: SharedAuditLog,
    /// (key, owner) pairs already warned about
    warned: HashSet<(String, String)>,
}

impl<S: LockStore, C: Clock> HealthMonitor<S, C> {
    pub fn new(
        coordinator: LockCoordinator<S, C>,
        settings: LockSettings,
        interval: Duration,
        audit: SharedAuditLog,
    ) -> Self {
        Self {
            coordinator,
            settings,
            interval,
            audit,
            warned: HashSet::new(),
        }
    }

    pub fn audit(&self) -> &SharedAuditLog {
        &self.audit
    }

    /// One pass over every lock key
    ///
    /// Only a failed SCAN fails the pass; per-key failures are counted and
    /// the scan moves on.
    pub async fn scan_once(&mut self) -> Result<ScanReport, StoreError> {
        let keys = self.coordinator.keys().clone();
        let all_keys = self.coordinator.store().scan(&keys.scan_pattern()).await?;

        let mut report = ScanReport::default();
        let mut seen = HashSet::new();

        for key in &all_keys {
            let Some(resource) = keys.resource_of(key) else {
                continue;
            };
            report.scanned += 1;
            if let Err(e) = self
                .inspect(resource, key, &mut report, &mut seen)
                .await
            {
                report.errors += 1;
                tracing::warn!(resource, error = %e, "failed to inspect lock");
            }
        }

        // Forget warnings for holders that are gone
        self.warned.retain(|entry| seen.contains(entry));

        tracing::debug!(
            scanned = report.scanned,
            held = report.held,
            evicted = report.evicted.len(),
            "monitor scan complete"
        );
        Ok(report)
    }

    async fn inspect(
        &mut self,
        resource: &str,
        key: &str,
        report: &mut ScanReport,
        seen: &mut HashSet<(String, String)>,
    ) -> Result<(), StoreError> {
        let Some(holder) = self
            .coordinator
            .holder(resource, self.settings.lock_timeout)
            .await?
        else {
            return Ok(());
        };
        report.held += 1;

        let tiers = self.settings.tiers;
        let age_secs = holder.age.map(|age| age.as_secs());
        let tier = match holder.age {
            Some(age) => tiers.classify(age),
            None => TimeoutTier::Hard,
        };
        let liveness = if tier.needs_liveness() {
            Some(
                self.coordinator
                    .heartbeats()
                    .liveness(resource, self.settings.heartbeat_timeout)
                    .await?,
            )
        } else {
            None
        };

        match decide(tier, liveness) {
            MonitorAction::None => {
                seen.insert((key.to_string(), holder.owner));
            }
            MonitorAction::Warn => {
                let entry = (key.to_string(), holder.owner.clone());
                seen.insert(entry.clone());
                if self.warned.insert(entry) {
                    self.coordinator.stats().record_warning();
                    tracing::warn!(
                        resource,
                        owner = %holder.owner,
                        age_secs = ?age_secs,
                        "lock held past warning threshold"
                    );
                    record_audit(
                        &self.audit,
                        AuditEntry {
                            resource: resource.to_string(),
                            key: key.to_string(),
                            owner: Some(holder.owner),
                            trigger: tier.into(),
                            action: AuditAction::Warned,
                            age_secs,
                        },
                    );
                    report.warned.push(resource.to_string());
                }
            }
            MonitorAction::ForceRelease => {
                let forced = self.coordinator.force_release(resource, tier.into()).await?;
                if forced.previous_owner.is_none() {
                    tracing::debug!(resource, "lock released before eviction");
                    return Ok(());
                }
                if forced.previous_owner.as_deref() != Some(holder.owner.as_str()) {
                    tracing::warn!(
                        resource,
                        observed = %holder.owner,
                        removed = forced.previous_owner.as_deref().unwrap_or("-"),
                        "holder changed during eviction"
                    );
                }
                tracing::warn!(
                    resource,
                    owner = %holder.owner,
                    %tier,
                    age_secs = ?age_secs,
                    heartbeat = ?liveness,
                    "evicted lock holder"
                );
                record_audit(
                    &self.audit,
                    AuditEntry {
                        resource: resource.to_string(),
                        key: key.to_string(),
                        owner: forced.previous_owner.clone(),
                        trigger: tier.into(),
                        action: AuditAction::ForceReleased,
                        age_secs,
                    },
                );
                report.evicted.push(Eviction {
                    resource: resource.to_string(),
                    previous_owner: forced.previous_owner,
                    tier,
                    age_secs,
                });
            }
        }
        Ok(())
    }

    /// Scan every interval until `shutdown` fires
    pub async fn run(&mut self, shutdown: CancellationToken) {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            "health monitor started"
        );
        loop {
            match self.scan_once().await {
                Ok(report) => {
                    let stats = self.coordinator.stats().snapshot();
                    tracing::info!(
                        held = report.held,
                        warned = report.warned.len(),
                        evicted = report.evicted.len(),
                        errors = report.errors,
                        forced_releases = stats.forced_releases,
                        warnings = stats.warnings,
                        "monitor scan"
                    );
                }
                Err(e) => tracing::error!(error = %e, "monitor scan failed"),
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        tracing::info!("health monitor stopped");
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
