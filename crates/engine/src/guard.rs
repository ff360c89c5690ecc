// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RAII handle for a held lock

use crate::coordinator::LockCoordinator;
use crate::heartbeat::HeartbeatHandle;
use gpulock_adapters::LockStore;
use gpulock_core::{Clock, OwnerId};
use std::time::Duration;

/// A held lock plus its heartbeat
///
/// Call [`LockGuard::release`] when the work is done. Dropping the guard
/// instead schedules the same stop-heartbeat-then-release sequence on the
/// current runtime; without a runtime the lock TTL takes over.
pub struct LockGuard<S: LockStore, C: Clock> {
    coordinator: LockCoordinator<S, C>,
    resource: String,
    owner: OwnerId,
    waited: Duration,
    heartbeat: Option<HeartbeatHandle>,
    released: bool,
}

impl<S: LockStore, C: Clock> LockGuard<S, C> {
    pub(crate) fn new(
        coordinator: LockCoordinator<S, C>,
        resource: String,
        owner: OwnerId,
        waited: Duration,
        heartbeat: HeartbeatHandle,
    ) -> Self {
        Self {
            coordinator,
            resource,
            owner,
            waited,
            heartbeat: Some(heartbeat),
            released: false,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// How long acquisition waited
    pub fn waited(&self) -> Duration {
        self.waited
    }

    /// Stop the heartbeat, then release
    ///
    /// Returns `false` when the lock was no longer ours (expired or force
    /// released) or the release failed; that is counted as an emergency
    /// release, never raised.
    pub async fn release(mut self) -> bool {
        self.released = true;
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.stop().await;
        }

        release_or_record(&self.coordinator, &self.resource, &self.owner).await
    }
}

/// Owner release shared by the explicit and drop paths; a release that
/// deletes nothing is counted as an emergency release
async fn release_or_record<S: LockStore, C: Clock>(
    coordinator: &LockCoordinator<S, C>,
    resource: &str,
    owner: &OwnerId,
) -> bool {
    let released = coordinator.release(resource, owner, "normal").await;
    if !released {
        coordinator.stats().record_emergency_release();
        tracing::warn!(resource, %owner, "lock was lost before release");
    }
    released
}

impl<S: LockStore, C: Clock> std::fmt::Debug for LockGuard<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("resource", &self.resource)
            .field("owner", &self.owner)
            .field("waited", &self.waited)
            .finish_non_exhaustive()
    }
}

impl<S: LockStore, C: Clock> Drop for LockGuard<S, C> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let heartbeat = self.heartbeat.take();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let coordinator = self.coordinator.clone();
                let resource = self.resource.clone();
                let owner = self.owner.clone();
                handle.spawn(async move {
                    if let Some(heartbeat) = heartbeat {
                        heartbeat.stop().await;
                    }
                    release_or_record(&coordinator, &resource, &owner).await;
                });
            }
            Err(_) => {
                if let Some(heartbeat) = heartbeat {
                    heartbeat.cancel();
                }
                tracing::warn!(
                    resource = %self.resource,
                    owner = %self.owner,
                    "lock guard dropped outside a runtime, lock will expire by ttl"
                );
            }
        }
    }
}
