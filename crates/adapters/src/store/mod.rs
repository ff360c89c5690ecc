// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination store adapters

mod redis;

pub use self::redis::RedisLockStore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeLockStore, StoreCall};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Payloads published on a subscribed channel
///
/// Dropping the receiver tears down the subscription.
pub type MessageReceiver = mpsc::UnboundedReceiver<String>;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend unreachable: {0}")]
    Connection(String),
    #[error("script failed: {0}")]
    Script(String),
    #[error("command failed: {0}")]
    Command(String),
    #[error("unexpected reply: {0}")]
    Protocol(String),
}

impl StoreError {
    /// The backend could not be reached at all
    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }
}

/// Remaining lifetime of a key
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyTtl {
    Missing,
    /// Key exists with no expiry
    Persistent,
    Expires(Duration),
}

/// Key/value store with expiry, atomic scripts and pub/sub
///
/// Lock records are only ever removed through `compare_and_delete` (owner
/// release) or `get_and_delete` (forced release).
#[async_trait]
pub trait LockStore: Clone + Send + Sync + 'static {
    /// Create `key = owner` with `ttl` only if the key is absent
    async fn try_acquire(&self, key: &str, owner: &str, ttl: Duration) -> Result<bool, StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn ttl(&self, key: &str) -> Result<KeyTtl, StoreError>;

    /// Unconditional write with expiry (heartbeat records only)
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Atomically delete `key` if it still holds `expected`
    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, StoreError>;

    /// Atomically read and delete `key`, returning what was removed
    async fn get_and_delete(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// All keys matching a glob pattern, walked with a cursor
    async fn scan(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    async fn publish(&self, channel: &str, message: &str) -> Result<(), StoreError>;

    async fn subscribe(&self, channel: &str) -> Result<MessageReceiver, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
