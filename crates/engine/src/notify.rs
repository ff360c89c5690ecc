// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Release notifications over store pub/sub
//!
//! Purely a latency optimization for waiters: a lost, late or duplicate
//! message only means the next poll picks up the change instead.

use gpulock_adapters::{LockStore, MessageReceiver};
use gpulock_core::{Clock, KeySpace};
use serde::{Deserialize, Serialize};

/// Payload published when a lock record is removed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseMessage {
    pub owner: String,
    pub reason: String,
    pub released_at_ms: u64,
}

#[derive(Clone)]
pub struct NotificationChannel<S, C> {
    store: S,
    keys: KeySpace,
    clock: C,
}

impl<S: LockStore, C: Clock> NotificationChannel<S, C> {
    pub fn new(store: S, keys: KeySpace, clock: C) -> Self {
        Self { store, keys, clock }
    }

    /// Best effort; failures are logged and dropped
    pub async fn publish_release(&self, resource: &str, owner: &str, reason: &str) {
        let message = ReleaseMessage {
            owner: owner.to_string(),
            reason: reason.to_string(),
            released_at_ms: self.clock.epoch_ms(),
        };
        let payload = match serde_json::to_string(&message) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!(resource, error = %e, "failed to encode release message");
                return;
            }
        };
        if let Err(e) = self
            .store
            .publish(&self.keys.channel(resource), &payload)
            .await
        {
            tracing::debug!(resource, error = %e, "release notification not published");
        }
    }

    /// Subscribe to releases of `resource`; `None` when subscribing failed
    pub async fn watch(&self, resource: &str) -> Option<ReleaseWatch> {
        match self.store.subscribe(&self.keys.channel(resource)).await {
            Ok(rx) => Some(ReleaseWatch { rx }),
            Err(e) => {
                tracing::debug!(resource, error = %e, "subscribe failed, polling only");
                None
            }
        }
    }
}

/// Live subscription held for the duration of one wait loop
pub struct ReleaseWatch {
    rx: MessageReceiver,
}

impl ReleaseWatch {
    /// Wait for the next message on the channel
    ///
    /// Returns the decoded message, or `None` for a payload that does not
    /// parse (still a wake-up). Never resolves once the subscription is gone.
    pub async fn notified(&mut self) -> Option<ReleaseMessage> {
        match self.rx.recv().await {
            Some(payload) => match serde_json::from_str(&payload) {
                Ok(message) => Some(message),
                Err(_) => {
                    tracing::trace!(payload = %payload, "unrecognized release payload");
                    None
                }
            },
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
