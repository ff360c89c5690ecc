// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gpulock-core: pure building blocks for the GPU lock manager
//!
//! This crate provides:
//! - Key layout, owner identities and configuration
//! - Backoff and tiered-timeout policies
//! - Statistics counters, health reports and the audit trail
//! - Clock and id abstractions for deterministic tests

pub mod audit;
pub mod backoff;
pub mod clock;
pub mod config;
pub mod health;
pub mod id;
pub mod keys;
pub mod stats;
pub mod tier;

pub use audit::{
    AuditAction, AuditEntry, AuditLog, AuditRecord, ReleaseTrigger,
    DEFAULT_CAPACITY as DEFAULT_AUDIT_CAPACITY,
};
pub use backoff::{BackoffPolicy, Jitter, NoJitter, UniformJitter};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{BackendConfig, Config, ConfigError, LockSettings, MonitorConfig};
pub use health::{HealthReport, HealthStatus, HeldLock, HeldLockClass, LockObservation};
pub use id::{IdGen, OwnerId, SequentialIdGen, UuidIdGen};
pub use keys::KeySpace;
pub use stats::{StatsRegistry, StatsSnapshot};
pub use tier::{decide, Liveness, MonitorAction, TimeoutTier, TimeoutTiers};
