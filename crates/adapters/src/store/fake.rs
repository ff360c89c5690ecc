// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory lock store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{KeyTtl, LockStore, MessageReceiver, StoreError};
use async_trait::async_trait;
use gpulock_core::{Clock, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    TryAcquire { key: String, owner: String },
    Get { key: String },
    Ttl { key: String },
    SetWithTtl { key: String, value: String },
    CompareAndDelete { key: String, expected: String },
    GetAndDelete { key: String },
    Scan { pattern: String },
    Publish { channel: String, message: String },
    Subscribe { channel: String },
    Ping,
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

#[derive(Default)]
struct FakeState {
    entries: HashMap<String, Entry>,
    subscribers: HashMap<String, Vec<mpsc::UnboundedSender<String>>>,
    published: Vec<(String, String)>,
    calls: Vec<StoreCall>,
    unavailable: bool,
    scripts_failing: bool,
}

/// In-memory store whose TTLs follow the given clock
#[derive(Clone)]
pub struct FakeLockStore<C: Clock = SystemClock> {
    clock: C,
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeLockStore<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> FakeLockStore<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Lock the state, record the call, and drop expired keys
    fn enter(&self, call: StoreCall) -> Result<std::sync::MutexGuard<'_, FakeState>, StoreError> {
        let now = self.clock.now();
        let mut state = self.lock();
        state.calls.push(call);
        if state.unavailable {
            return Err(StoreError::Connection("fake store unavailable".to_string()));
        }
        state
            .entries
            .retain(|_, entry| entry.expires_at.map_or(true, |at| at > now));
        Ok(state)
    }

    fn enter_script(
        &self,
        call: StoreCall,
    ) -> Result<std::sync::MutexGuard<'_, FakeState>, StoreError> {
        let state = self.enter(call)?;
        if state.scripts_failing {
            return Err(StoreError::Script("fake script failure".to_string()));
        }
        Ok(state)
    }

    /// Make every call fail with a connection error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Make the atomic scripts fail while plain commands keep working
    pub fn fail_scripts(&self, failing: bool) {
        self.lock().scripts_failing = failing;
    }

    /// Plant a key directly, bypassing the acquire path
    pub fn insert(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| self.clock.now() + ttl);
        self.lock().entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
    }

    /// Current value of a key, honouring expiry
    pub fn value(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        self.lock()
            .entries
            .get(key)
            .filter(|e| e.expires_at.map_or(true, |at| at > now))
            .map(|e| e.value.clone())
    }

    /// Remove a key as if its TTL had fired
    pub fn expire(&self, key: &str) {
        self.lock().entries.remove(key);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Messages published on a channel, oldest first
    pub fn published(&self, channel: &str) -> Vec<String> {
        self.lock()
            .published
            .iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Live subscriptions on a channel
    pub fn subscriber_count(&self, channel: &str) -> usize {
        let mut state = self.lock();
        match state.subscribers.get_mut(channel) {
            Some(senders) => {
                senders.retain(|tx| !tx.is_closed());
                senders.len()
            }
            None => 0,
        }
    }
}

/// Glob match supporting `*` wildcards
fn glob_match(pattern: &str, key: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return key.is_empty();
    };
    let Some(mut rest) = key.strip_prefix(first) else {
        return false;
    };
    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        return rest.is_empty();
    };
    for part in middle {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}

#[async_trait]
impl<C: Clock> LockStore for FakeLockStore<C> {
    async fn try_acquire(&self, key: &str, owner: &str, ttl: Duration) -> Result<bool, StoreError> {
        let now = self.clock.now();
        let mut state = self.enter(StoreCall::TryAcquire {
            key: key.to_string(),
            owner: owner.to_string(),
        })?;
        if state.entries.contains_key(key) {
            return Ok(false);
        }
        state.entries.insert(
            key.to_string(),
            Entry {
                value: owner.to_string(),
                expires_at: Some(now + ttl),
            },
        );
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let state = self.enter(StoreCall::Get {
            key: key.to_string(),
        })?;
        Ok(state.entries.get(key).map(|e| e.value.clone()))
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl, StoreError> {
        let now = self.clock.now();
        let state = self.enter(StoreCall::Ttl {
            key: key.to_string(),
        })?;
        Ok(match state.entries.get(key) {
            None => KeyTtl::Missing,
            Some(Entry {
                expires_at: None, ..
            }) => KeyTtl::Persistent,
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => KeyTtl::Expires(at.saturating_duration_since(now)),
        })
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut state = self.enter(StoreCall::SetWithTtl {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        state.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(now + ttl),
            },
        );
        Ok(())
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, StoreError> {
        let mut state = self.enter_script(StoreCall::CompareAndDelete {
            key: key.to_string(),
            expected: expected.to_string(),
        })?;
        let matches = state
            .entries
            .get(key)
            .is_some_and(|e| e.value == expected);
        if matches {
            state.entries.remove(key);
        }
        Ok(matches)
    }

    async fn get_and_delete(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut state = self.enter_script(StoreCall::GetAndDelete {
            key: key.to_string(),
        })?;
        Ok(state.entries.remove(key).map(|e| e.value))
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let state = self.enter(StoreCall::Scan {
            pattern: pattern.to_string(),
        })?;
        let mut keys: Vec<String> = state
            .entries
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<(), StoreError> {
        let mut state = self.enter(StoreCall::Publish {
            channel: channel.to_string(),
            message: message.to_string(),
        })?;
        state
            .published
            .push((channel.to_string(), message.to_string()));
        if let Some(senders) = state.subscribers.get_mut(channel) {
            senders.retain(|tx| tx.send(message.to_string()).is_ok());
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<MessageReceiver, StoreError> {
        let mut state = self.enter(StoreCall::Subscribe {
            channel: channel.to_string(),
        })?;
        let (tx, rx) = mpsc::unbounded_channel();
        state
            .subscribers
            .entry(channel.to_string())
            .or_default()
            .push(tx);
        Ok(rx)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.enter(StoreCall::Ping)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
