// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for lock coordination

use gpulock_adapters::StoreError;
use std::time::Duration;
use thiserror::Error;

/// The lock stayed held for the whole wait window
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unavailable {
    pub resource: String,
    pub waited: Duration,
    pub attempts: u32,
    /// Holder seen after the last attempt, if it could be read
    pub holder: Option<String>,
}

impl std::fmt::Display for Unavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} still held after {} ({} attempts)",
            self.resource,
            humantime::format_duration(Duration::from_millis(self.waited.as_millis() as u64)),
            self.attempts
        )?;
        if let Some(holder) = &self.holder {
            write!(f, " by {}", holder)?;
        }
        Ok(())
    }
}

/// Errors from the acquisition path
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("coordination backend unavailable for {resource}: {source}")]
    BackendUnavailable {
        resource: String,
        #[source]
        source: StoreError,
    },
}

/// Errors from running work under an exclusive lock
#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock unavailable: {0}")]
    Unavailable(Unavailable),
    #[error("coordination backend unavailable for {resource}: {source}")]
    BackendUnavailable {
        resource: String,
        #[source]
        source: StoreError,
    },
}

impl From<CoordinatorError> for LockError {
    fn from(err: CoordinatorError) -> Self {
        match err {
            CoordinatorError::BackendUnavailable { resource, source } => {
                LockError::BackendUnavailable { resource, source }
            }
        }
    }
}
