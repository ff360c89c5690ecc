// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Holder liveness via periodically renewed heartbeat records

use gpulock_adapters::{LockStore, StoreError};
use gpulock_core::{Clock, KeySpace, Liveness, LockSettings, OwnerId, StatsRegistry};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct HeartbeatTracker<S, C> {
    store: S,
    keys: KeySpace,
    clock: C,
    stats: StatsRegistry,
}

impl<S: LockStore, C: Clock> HeartbeatTracker<S, C> {
    pub fn new(store: S, keys: KeySpace, clock: C, stats: StatsRegistry) -> Self {
        Self {
            store,
            keys,
            clock,
            stats,
        }
    }

    /// Start renewing the heartbeat of `resource` on behalf of `owner`
    ///
    /// The first write happens immediately. Must be called from within a
    /// tokio runtime.
    pub fn start(&self, resource: &str, owner: &OwnerId, settings: &LockSettings) -> HeartbeatHandle {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let store = self.store.clone();
        let clock = self.clock.clone();
        let stats = self.stats.clone();
        let key = self.keys.heartbeat_key(resource);
        let resource = resource.to_string();
        let owner = owner.to_string();
        let interval = settings.heartbeat_interval;
        let ttl = settings.heartbeat_ttl();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        let now = clock.epoch_ms().to_string();
                        if let Err(e) = store.set_with_ttl(&key, &now, ttl).await {
                            stats.record_heartbeat_failure();
                            tracing::warn!(%resource, %owner, error = %e, "heartbeat write failed");
                        }
                    }
                }
            }
            tracing::trace!(%resource, "heartbeat stopped");
        });

        HeartbeatHandle {
            token,
            task: Some(task),
        }
    }

    /// Classify the holder of `resource` by heartbeat freshness
    ///
    /// The heartbeat record carries only a timestamp, not an owner. A
    /// previous holder whose lock expired by TTL keeps renewing it until its
    /// guard is released, so a new holder that crashed without ever
    /// heartbeating still reads as alive and is only evicted at the hard
    /// tier.
    pub async fn liveness(&self, resource: &str, timeout: Duration) -> Result<Liveness, StoreError> {
        let Some(value) = self.store.get(&self.keys.heartbeat_key(resource)).await? else {
            return Ok(Liveness::Missing);
        };
        let Ok(written_ms) = value.trim().parse::<u64>() else {
            tracing::warn!(resource, value = %value, "unparseable heartbeat record");
            return Ok(Liveness::Missing);
        };
        let age = Duration::from_millis(self.clock.epoch_ms().saturating_sub(written_ms));
        Ok(Liveness::from_age(age, timeout))
    }
}

/// Owns a running heartbeat task; cancelling it stops renewals
pub struct HeartbeatHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl HeartbeatHandle {
    /// Cancel and wait for the task, so no write lands afterwards
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "heartbeat task ended abnormally");
            }
        }
    }

    /// Cancel without waiting
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for HeartbeatHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
