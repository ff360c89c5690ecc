// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backing-store key layout
//!
//! ```text
//! <ns>:<resource>            -> owner id        (TTL = lock_timeout)
//! <ns>:<resource>:heartbeat  -> epoch millis    (TTL = 2 x heartbeat_interval)
//! channel <ns>:<resource>    -> release messages
//! ```

use serde::{Deserialize, Serialize};

pub const HEARTBEAT_SUFFIX: &str = ":heartbeat";

pub const DEFAULT_NAMESPACE: &str = "gpulock";

/// Namespace under which all lock keys live
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeySpace {
    namespace: String,
}

impl KeySpace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn lock_key(&self, resource: &str) -> String {
        format!("{}:{}", self.namespace, resource)
    }

    pub fn heartbeat_key(&self, resource: &str) -> String {
        format!("{}:{}{}", self.namespace, resource, HEARTBEAT_SUFFIX)
    }

    /// Pub/sub channel carrying release notifications for a resource
    pub fn channel(&self, resource: &str) -> String {
        self.lock_key(resource)
    }

    /// Glob matching every key in the namespace (lock and heartbeat keys alike)
    pub fn scan_pattern(&self) -> String {
        format!("{}:*", self.namespace)
    }

    /// Resource id of a lock key, or `None` for heartbeat keys and keys
    /// outside this namespace
    pub fn resource_of<'a>(&self, key: &'a str) -> Option<&'a str> {
        let rest = key
            .strip_prefix(self.namespace.as_str())?
            .strip_prefix(':')?;
        if rest.is_empty() || rest.ends_with(HEARTBEAT_SUFFIX) {
            return None;
        }
        Some(rest)
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}
