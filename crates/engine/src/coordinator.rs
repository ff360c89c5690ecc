// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exclusive resource locks on top of a LockStore
//!
//! A lock record is created with a single atomic create-if-absent and is
//! only ever removed by the owner's compare-and-delete or by a forced
//! get-and-delete. Waiters back off with jitter and, when enabled, race
//! each sleep against a release notification.

use crate::error::{CoordinatorError, LockError, Unavailable};
use crate::guard::LockGuard;
use crate::heartbeat::HeartbeatTracker;
use crate::notify::{NotificationChannel, ReleaseWatch};
use futures::FutureExt;
use gpulock_adapters::{KeyTtl, LockStore, StoreError};
use gpulock_core::{
    BackoffPolicy, Clock, KeySpace, LockSettings, OwnerId, ReleaseTrigger, StatsRegistry,
    SystemClock, UniformJitter, UuidIdGen,
};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

/// Result of an acquisition attempt
pub enum Acquisition<S: LockStore, C: Clock = SystemClock> {
    Acquired(LockGuard<S, C>),
    Unavailable(Unavailable),
}

impl<S: LockStore, C: Clock> Acquisition<S, C> {
    pub fn is_acquired(&self) -> bool {
        matches!(self, Acquisition::Acquired(_))
    }

    pub fn into_guard(self) -> Option<LockGuard<S, C>> {
        match self {
            Acquisition::Acquired(guard) => Some(guard),
            Acquisition::Unavailable(_) => None,
        }
    }
}

impl<S: LockStore, C: Clock> std::fmt::Debug for Acquisition<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Acquisition::Acquired(guard) => f.debug_tuple("Acquired").field(guard).finish(),
            Acquisition::Unavailable(u) => f.debug_tuple("Unavailable").field(u).finish(),
        }
    }
}

/// What happened to an owner release
#[derive(Debug)]
pub enum ReleaseOutcome {
    Released,
    /// The record was gone or held by someone else; nothing was deleted
    NotOwner { holder: Option<String> },
    Failed(StoreError),
}

/// Result of a forced release
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForcedRelease {
    pub resource: String,
    /// Owner that was evicted, `None` when the lock was already free
    pub previous_owner: Option<String>,
}

/// Current holder of a lock record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Holder {
    pub owner: String,
    /// Time since acquisition; `None` when the record has no TTL
    pub age: Option<Duration>,
}

#[derive(Clone)]
pub struct LockCoordinator<S: LockStore, C: Clock = SystemClock> {
    store: S,
    keys: KeySpace,
    clock: C,
    stats: StatsRegistry,
    heartbeats: HeartbeatTracker<S, C>,
    notifications: NotificationChannel<S, C>,
}

impl<S: LockStore, C: Clock> LockCoordinator<S, C> {
    pub fn new(store: S, keys: KeySpace, clock: C) -> Self {
        Self::with_stats(store, keys, clock, StatsRegistry::new())
    }

    pub fn with_stats(store: S, keys: KeySpace, clock: C, stats: StatsRegistry) -> Self {
        Self {
            heartbeats: HeartbeatTracker::new(
                store.clone(),
                keys.clone(),
                clock.clone(),
                stats.clone(),
            ),
            notifications: NotificationChannel::new(store.clone(), keys.clone(), clock.clone()),
            store,
            keys,
            clock,
            stats,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn stats(&self) -> &StatsRegistry {
        &self.stats
    }

    pub fn heartbeats(&self) -> &HeartbeatTracker<S, C> {
        &self.heartbeats
    }

    pub fn notifications(&self) -> &NotificationChannel<S, C> {
        &self.notifications
    }

    /// Wait up to `settings.max_wait_time` for exclusive access to `resource`
    ///
    /// Contention is reported as `Acquisition::Unavailable`; only a store
    /// failure is an error, and it aborts the wait immediately.
    pub async fn acquire(
        &self,
        resource: &str,
        owner: OwnerId,
        settings: &LockSettings,
    ) -> Result<Acquisition<S, C>, CoordinatorError> {
        let key = self.keys.lock_key(resource);
        let policy = BackoffPolicy::from_settings(settings);
        let mut jitter = UniformJitter::new();
        let started = tokio::time::Instant::now();
        let mut attempts: u32 = 0;
        let mut watch: Option<ReleaseWatch> = None;
        let mut subscribed = false;

        self.stats.record_attempt();

        loop {
            attempts += 1;
            let acquired = match self
                .store
                .try_acquire(&key, owner.as_str(), settings.lock_timeout)
                .await
            {
                Ok(acquired) => acquired,
                Err(source) => {
                    self.stats.record_backend_failure();
                    tracing::error!(resource, %owner, error = %source, "lock backend unavailable");
                    return Err(CoordinatorError::BackendUnavailable {
                        resource: resource.to_string(),
                        source,
                    });
                }
            };

            let waited = started.elapsed();
            if acquired {
                self.stats.record_success(waited);
                tracing::info!(
                    resource,
                    %owner,
                    attempts,
                    waited_ms = waited.as_millis() as u64,
                    "lock acquired"
                );
                let heartbeat = self.heartbeats.start(resource, &owner, settings);
                return Ok(Acquisition::Acquired(LockGuard::new(
                    self.clone(),
                    resource.to_string(),
                    owner,
                    waited,
                    heartbeat,
                )));
            }

            if waited >= settings.max_wait_time {
                let holder = self.store.get(&key).await.ok().flatten();
                self.stats.record_timeout();
                tracing::info!(
                    resource,
                    %owner,
                    attempts,
                    waited_ms = waited.as_millis() as u64,
                    holder = holder.as_deref().unwrap_or("-"),
                    "lock unavailable"
                );
                return Ok(Acquisition::Unavailable(Unavailable {
                    resource: resource.to_string(),
                    waited,
                    attempts,
                    holder,
                }));
            }

            let delay = policy
                .delay(attempts - 1, &mut jitter)
                .min(settings.max_wait_time - waited);

            if settings.notifications && !subscribed {
                subscribed = true;
                watch = self.notifications.watch(resource).await;
            }

            tracing::debug!(resource, attempts, delay_ms = delay.as_millis() as u64, "lock busy, waiting");
            match watch.as_mut() {
                Some(watch) => {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        message = watch.notified() => {
                            tracing::debug!(
                                resource,
                                reason = message.as_ref().map(|m| m.reason.as_str()).unwrap_or("-"),
                                "woken by release notification"
                            );
                        }
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
        }
    }

    /// Delete the lock only if `owner` still holds it
    pub async fn release_outcome(&self, resource: &str, owner: &OwnerId, reason: &str) -> ReleaseOutcome {
        let key = self.keys.lock_key(resource);
        self.stats.record_release_attempt();

        match self.store.compare_and_delete(&key, owner.as_str()).await {
            Ok(true) => {
                self.stats.record_release();
                tracing::info!(resource, %owner, reason, "lock released");
                self.notifications
                    .publish_release(resource, owner.as_str(), reason)
                    .await;
                ReleaseOutcome::Released
            }
            Ok(false) => {
                self.stats.record_ownership_violation();
                let holder = self.store.get(&key).await.ok().flatten();
                tracing::warn!(
                    resource,
                    %owner,
                    reason,
                    holder = holder.as_deref().unwrap_or("-"),
                    "release skipped, lock not held by this owner"
                );
                ReleaseOutcome::NotOwner { holder }
            }
            Err(e) => {
                self.stats.record_script_error();
                tracing::error!(resource, %owner, reason, error = %e, "lock release failed");
                ReleaseOutcome::Failed(e)
            }
        }
    }

    /// Owner release; `true` only when this call deleted the record
    pub async fn release(&self, resource: &str, owner: &OwnerId, reason: &str) -> bool {
        matches!(
            self.release_outcome(resource, owner, reason).await,
            ReleaseOutcome::Released
        )
    }

    /// Remove the lock whoever holds it
    ///
    /// A lock that is already free counts as success.
    pub async fn force_release(
        &self,
        resource: &str,
        trigger: ReleaseTrigger,
    ) -> Result<ForcedRelease, StoreError> {
        let key = self.keys.lock_key(resource);
        let previous_owner = self.store.get_and_delete(&key).await?;

        match &previous_owner {
            Some(owner) => {
                self.stats.record_forced_release();
                tracing::warn!(resource, owner, %trigger, "lock force-released");
                let reason = format!("forced:{}", trigger);
                self.notifications
                    .publish_release(resource, owner, &reason)
                    .await;
            }
            None => tracing::debug!(resource, %trigger, "force release of free lock"),
        }

        Ok(ForcedRelease {
            resource: resource.to_string(),
            previous_owner,
        })
    }

    /// Current holder and age of the lock, `None` when free
    ///
    /// Age is derived from the remaining TTL, since every record is created
    /// with TTL = `lock_timeout` and never refreshed.
    pub async fn holder(&self, resource: &str, lock_timeout: Duration) -> Result<Option<Holder>, StoreError> {
        let key = self.keys.lock_key(resource);
        let Some(owner) = self.store.get(&key).await? else {
            return Ok(None);
        };
        let age = match self.store.ttl(&key).await? {
            KeyTtl::Missing => return Ok(None),
            KeyTtl::Persistent => None,
            KeyTtl::Expires(remaining) => Some(lock_timeout.saturating_sub(remaining)),
        };
        Ok(Some(Holder { owner, age }))
    }

    /// Run `work` while holding `resource` exclusively
    ///
    /// The lock is released on every exit path, including a panic in
    /// `work`, which is resumed after the release.
    pub async fn with_exclusive_resource<F, Fut, T>(
        &self,
        resource: &str,
        settings: &LockSettings,
        work: F,
    ) -> Result<T, LockError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let owner = OwnerId::generate(&UuidIdGen);
        let guard = match self.acquire(resource, owner, settings).await? {
            Acquisition::Acquired(guard) => guard,
            Acquisition::Unavailable(unavailable) => {
                return Err(LockError::Unavailable(unavailable))
            }
        };

        let result = AssertUnwindSafe(async { work().await }).catch_unwind().await;
        guard.release().await;

        match result {
            Ok(value) => Ok(value),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
