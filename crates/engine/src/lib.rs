// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! GPU lock coordination: acquisition, heartbeats, release
//! notifications and the tiered health monitor

mod coordinator;
mod error;
mod guard;
mod heartbeat;
mod inspect;
mod monitor;
mod notify;

pub use coordinator::{Acquisition, ForcedRelease, Holder, LockCoordinator, ReleaseOutcome};
pub use error::{CoordinatorError, LockError, Unavailable};
pub use guard::LockGuard;
pub use heartbeat::{HeartbeatHandle, HeartbeatTracker};
pub use inspect::Inspector;
pub use monitor::{Eviction, HealthMonitor, ScanReport, SharedAuditLog};
pub use notify::{NotificationChannel, ReleaseMessage, ReleaseWatch};
