// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use crate::store::{KeyTtl, LockStore, MessageReceiver, StoreError};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Wrapper that adds tracing to any LockStore
#[derive(Clone)]
pub struct TracedLockStore<S> {
    inner: S,
}

impl<S> TracedLockStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn log_outcome<T: std::fmt::Debug>(result: &Result<T, StoreError>, start: Instant) {
    let elapsed_ms = start.elapsed().as_millis() as u64;
    match result {
        Ok(value) => tracing::trace!(elapsed_ms, ?value, "ok"),
        Err(e) if e.is_connection() => tracing::warn!(elapsed_ms, error = %e, "backend unreachable"),
        Err(e) => tracing::error!(elapsed_ms, error = %e, "failed"),
    }
}

#[async_trait]
impl<S: LockStore> LockStore for TracedLockStore<S> {
    async fn try_acquire(&self, key: &str, owner: &str, ttl: Duration) -> Result<bool, StoreError> {
        let span = tracing::debug_span!("store.try_acquire", key, owner);
        async {
            let start = Instant::now();
            let result = self.inner.try_acquire(key, owner, ttl).await;
            match &result {
                Ok(true) => tracing::debug!(ttl_ms = ttl.as_millis() as u64, "acquired"),
                Ok(false) => tracing::debug!("held by another owner"),
                Err(_) => {}
            }
            log_outcome(&result, start);
            result
        }
        .instrument(span)
        .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let span = tracing::trace_span!("store.get", key);
        async {
            let start = Instant::now();
            let result = self.inner.get(key).await;
            log_outcome(&result, start);
            result
        }
        .instrument(span)
        .await
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl, StoreError> {
        let span = tracing::trace_span!("store.ttl", key);
        async {
            let start = Instant::now();
            let result = self.inner.ttl(key).await;
            log_outcome(&result, start);
            result
        }
        .instrument(span)
        .await
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let span = tracing::trace_span!("store.set_with_ttl", key);
        async {
            let start = Instant::now();
            let result = self.inner.set_with_ttl(key, value, ttl).await;
            log_outcome(&result, start);
            result
        }
        .instrument(span)
        .await
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, StoreError> {
        let span = tracing::debug_span!("store.compare_and_delete", key, expected);
        async {
            let start = Instant::now();
            let result = self.inner.compare_and_delete(key, expected).await;
            if let Ok(deleted) = &result {
                tracing::debug!(deleted, "compare and delete");
            }
            log_outcome(&result, start);
            result
        }
        .instrument(span)
        .await
    }

    async fn get_and_delete(&self, key: &str) -> Result<Option<String>, StoreError> {
        let span = tracing::debug_span!("store.get_and_delete", key);
        async {
            let start = Instant::now();
            let result = self.inner.get_and_delete(key).await;
            if let Ok(previous) = &result {
                tracing::debug!(previous = previous.as_deref().unwrap_or("-"), "get and delete");
            }
            log_outcome(&result, start);
            result
        }
        .instrument(span)
        .await
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let span = tracing::debug_span!("store.scan", pattern);
        async {
            let start = Instant::now();
            let result = self.inner.scan(pattern).await;
            if let Ok(keys) = &result {
                tracing::debug!(
                    count = keys.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "scanned"
                );
            } else {
                log_outcome(&result, start);
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<(), StoreError> {
        let span = tracing::trace_span!("store.publish", channel);
        async {
            let start = Instant::now();
            let result = self.inner.publish(channel, message).await;
            log_outcome(&result, start);
            result
        }
        .instrument(span)
        .await
    }

    async fn subscribe(&self, channel: &str) -> Result<MessageReceiver, StoreError> {
        let span = tracing::debug_span!("store.subscribe", channel);
        async {
            let start = Instant::now();
            let result = self.inner.subscribe(channel).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(_) => tracing::debug!(elapsed_ms, "subscribed"),
                Err(e) => tracing::debug!(elapsed_ms, error = %e, "subscribe failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let span = tracing::debug_span!("store.ping");
        async {
            let start = Instant::now();
            let result = self.inner.ping().await;
            log_outcome(&result, start);
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
