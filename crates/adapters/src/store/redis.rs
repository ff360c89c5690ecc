// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redis-backed lock store

use super::{KeyTtl, LockStore, MessageReceiver, StoreError};
use ::redis::aio::ConnectionManager;
use ::redis::{Client, ErrorKind, RedisError, Script};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const COMPARE_AND_DELETE: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

const GET_AND_DELETE: &str = r#"
local value = redis.call("GET", KEYS[1])
if value then
    redis.call("DEL", KEYS[1])
end
return value
"#;

/// Keys returned per SCAN round trip
const SCAN_COUNT: usize = 100;

#[derive(Clone)]
pub struct RedisLockStore {
    client: Client,
    conn: ConnectionManager,
    compare_and_delete: Arc<Script>,
    get_and_delete: Arc<Script>,
}

impl RedisLockStore {
    /// Connect to `url`, failing fast when the server is unreachable
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(|e| StoreError::Connection(e.to_string()))?;

        // Probe once so an unreachable server fails immediately instead of
        // going through the manager's reconnect schedule
        let mut probe = client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_error)?;
        let _: String = ::redis::cmd("PING")
            .query_async(&mut probe)
            .await
            .map_err(map_error)?;

        let conn = ConnectionManager::new(client.clone())
            .await
            .map_err(map_error)?;

        Ok(Self {
            client,
            conn,
            compare_and_delete: Arc::new(Script::new(COMPARE_AND_DELETE)),
            get_and_delete: Arc::new(Script::new(GET_AND_DELETE)),
        })
    }
}

fn map_error(e: RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout()
    {
        return StoreError::Connection(e.to_string());
    }
    match e.kind() {
        ErrorKind::TypeError => StoreError::Protocol(e.to_string()),
        _ => StoreError::Command(e.to_string()),
    }
}

/// Script failures keep their connection classification
fn map_script_error(e: RedisError) -> StoreError {
    match map_error(e) {
        StoreError::Command(msg) => StoreError::Script(msg),
        other => other,
    }
}

fn millis(ttl: Duration) -> u64 {
    (ttl.as_millis() as u64).max(1)
}

#[async_trait]
impl LockStore for RedisLockStore {
    async fn try_acquire(&self, key: &str, owner: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = ::redis::cmd("SET")
            .arg(key)
            .arg(owner)
            .arg("NX")
            .arg("PX")
            .arg(millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(map_error)?;
        Ok(reply.is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        ::redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_error)
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl, StoreError> {
        let mut conn = self.conn.clone();
        let ms: i64 = ::redis::cmd("PTTL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_error)?;
        match ms {
            -2 => Ok(KeyTtl::Missing),
            -1 => Ok(KeyTtl::Persistent),
            ms if ms >= 0 => Ok(KeyTtl::Expires(Duration::from_millis(ms as u64))),
            other => Err(StoreError::Protocol(format!("PTTL returned {}", other))),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = ::redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let deleted: i64 = self
            .compare_and_delete
            .key(key)
            .arg(expected)
            .invoke_async(&mut conn)
            .await
            .map_err(map_script_error)?;
        Ok(deleted == 1)
    }

    async fn get_and_delete(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        self.get_and_delete
            .key(key)
            .invoke_async(&mut conn)
            .await
            .map_err(map_script_error)
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = ::redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await
                .map_err(map_error)?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        // SCAN may return a key more than once
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: i64 = ::redis::cmd("PUBLISH")
            .arg(channel)
            .arg(message)
            .query_async(&mut conn)
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<MessageReceiver, StoreError> {
        let mut pubsub = self.client.get_async_pubsub().await.map_err(map_error)?;
        pubsub.subscribe(channel).await.map_err(map_error)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let channel = channel.to_string();
        tokio::spawn(async move {
            let mut messages = Box::pin(pubsub.into_on_message());
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    msg = messages.next() => {
                        let Some(msg) = msg else {
                            tracing::debug!(channel = %channel, "subscription closed by server");
                            break;
                        };
                        let payload: String = msg.get_payload().unwrap_or_default();
                        if tx.send(payload).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = ::redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(map_error)?;
        Ok(())
    }
}
