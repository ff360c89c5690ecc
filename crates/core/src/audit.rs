// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit trail of monitor and operator interventions
//!
//! Every warning and forced release is kept in a bounded in-memory ring and,
//! when a path is configured, appended to a JSON-lines file.

use crate::tier::TimeoutTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Records kept in memory when no capacity is given
pub const DEFAULT_CAPACITY: usize = 1024;

/// What caused an intervention
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ReleaseTrigger {
    Tier(TimeoutTier),
    /// Operator request
    Manual,
}

impl ReleaseTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseTrigger::Tier(tier) => tier.as_str(),
            ReleaseTrigger::Manual => "manual",
        }
    }
}

impl std::fmt::Display for ReleaseTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ReleaseTrigger> for String {
    fn from(trigger: ReleaseTrigger) -> Self {
        trigger.as_str().to_string()
    }
}

impl TryFrom<String> for ReleaseTrigger {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ok(match s.as_str() {
            "manual" => ReleaseTrigger::Manual,
            "normal" => ReleaseTrigger::Tier(TimeoutTier::Normal),
            "warning" => ReleaseTrigger::Tier(TimeoutTier::Warning),
            "soft" => ReleaseTrigger::Tier(TimeoutTier::Soft),
            "hard" => ReleaseTrigger::Tier(TimeoutTier::Hard),
            other => return Err(format!("unknown trigger: {}", other)),
        })
    }
}

impl From<TimeoutTier> for ReleaseTrigger {
    fn from(tier: TimeoutTier) -> Self {
        ReleaseTrigger::Tier(tier)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Warned,
    ForceReleased,
}

/// An intervention before it is sequenced and timestamped
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditEntry {
    pub resource: String,
    pub key: String,
    /// Holder at the time of the intervention, if any
    pub owner: Option<String>,
    pub trigger: ReleaseTrigger,
    pub action: AuditAction,
    /// Lock age in whole seconds, `None` when unknown
    pub age_secs: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Monotonic sequence number
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub resource: String,
    pub key: String,
    pub owner: Option<String>,
    pub tier: ReleaseTrigger,
    pub action: AuditAction,
    pub age_secs: Option<u64>,
}

/// Bounded audit ring with an optional JSONL file behind it
#[derive(Debug)]
pub struct AuditLog {
    path: Option<PathBuf>,
    sequence: u64,
    capacity: usize,
    recent: VecDeque<AuditRecord>,
}

impl AuditLog {
    /// Memory-only log
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            path: None,
            sequence: 0,
            capacity: capacity.max(1),
            recent: VecDeque::new(),
        }
    }

    /// Open or create a log file, continuing its sequence numbering
    pub fn open(path: PathBuf, capacity: usize) -> std::io::Result<Self> {
        let sequence = if path.exists() {
            let file = File::open(&path)?;
            BufReader::new(file).lines().count() as u64
        } else {
            0
        };

        Ok(Self {
            path: Some(path),
            sequence,
            capacity: capacity.max(1),
            recent: VecDeque::new(),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Sequence and timestamp an entry, keep it, and append it to the file
    ///
    /// The in-memory copy is kept even when the file write fails.
    pub fn append(&mut self, entry: AuditEntry) -> std::io::Result<AuditRecord> {
        self.sequence += 1;

        let record = AuditRecord {
            sequence: self.sequence,
            timestamp: Utc::now(),
            resource: entry.resource,
            key: entry.key,
            owner: entry.owner,
            tier: entry.trigger,
            action: entry.action,
            age_secs: entry.age_secs,
        };

        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(record.clone());

        if let Some(path) = &self.path {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            let json = serde_json::to_string(&record)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            writeln!(file, "{}", json)?;
        }

        Ok(record)
    }

    /// Records still held in memory, oldest first
    pub fn recent(&self) -> impl Iterator<Item = &AuditRecord> {
        self.recent.iter()
    }

    /// Read every record from the backing file
    pub fn read_all(&self) -> std::io::Result<Vec<AuditRecord>> {
        let Some(path) = &self.path else {
            return Ok(self.recent.iter().cloned().collect());
        };
        if !path.exists() {
            return Ok(vec![]);
        }

        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let record: AuditRecord = serde_json::from_str(&line)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            records.push(record);
        }
        Ok(records)
    }

    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::in_memory(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
