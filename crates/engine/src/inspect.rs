// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator queries and manual interventions

use crate::coordinator::{ForcedRelease, LockCoordinator};
use crate::monitor::{record_audit, SharedAuditLog};
use gpulock_adapters::{LockStore, StoreError};
use gpulock_core::{
    AuditAction, AuditEntry, Clock, HealthReport, LockObservation, LockSettings, ReleaseTrigger,
    StatsSnapshot,
};
use std::time::Duration;

pub struct Inspector<S: LockStore, C: Clock> {
    coordinator: LockCoordinator<S, C>,
    settings: LockSettings,
    long_held_threshold: Duration,
    audit: SharedAuditLog,
}

impl<S: LockStore, C: Clock> Inspector<S, C> {
    pub fn new(
        coordinator: LockCoordinator<S, C>,
        settings: LockSettings,
        long_held_threshold: Duration,
        audit: SharedAuditLog,
    ) -> Self {
        Self {
            coordinator,
            settings,
            long_held_threshold,
            audit,
        }
    }

    /// Classify every held lock by heartbeat presence and age
    pub async fn health(&self) -> Result<HealthReport, StoreError> {
        let keys = self.coordinator.keys();
        let all_keys = self.coordinator.store().scan(&keys.scan_pattern()).await?;

        let mut observations = Vec::new();
        for key in &all_keys {
            let Some(resource) = keys.resource_of(key) else {
                continue;
            };
            let Some(holder) = self
                .coordinator
                .holder(resource, self.settings.lock_timeout)
                .await?
            else {
                continue;
            };
            let heartbeat = self
                .coordinator
                .heartbeats()
                .liveness(resource, self.settings.heartbeat_timeout)
                .await?;
            observations.push(LockObservation {
                resource: resource.to_string(),
                owner: holder.owner,
                age: holder.age,
                heartbeat,
            });
        }

        Ok(HealthReport::from_locks(
            observations,
            &self.settings.tiers,
            self.long_held_threshold,
        ))
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.coordinator.stats().snapshot()
    }

    /// Operator-requested forced release, audited with the manual trigger
    pub async fn force_release(&self, resource: &str) -> Result<ForcedRelease, StoreError> {
        let age_secs = match self
            .coordinator
            .holder(resource, self.settings.lock_timeout)
            .await
        {
            Ok(holder) => holder.and_then(|h| h.age).map(|age| age.as_secs()),
            Err(_) => None,
        };

        let forced = self
            .coordinator
            .force_release(resource, ReleaseTrigger::Manual)
            .await?;

        if forced.previous_owner.is_some() {
            record_audit(
                &self.audit,
                AuditEntry {
                    resource: resource.to_string(),
                    key: self.coordinator.keys().lock_key(resource),
                    owner: forced.previous_owner.clone(),
                    trigger: ReleaseTrigger::Manual,
                    action: AuditAction::ForceReleased,
                    age_secs,
                },
            );
        }
        Ok(forced)
    }
}

#[cfg(test)]
#[path = "inspect_tests.rs"]
mod tests;
