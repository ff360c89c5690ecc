// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Poll delay policy for lock waiters
//!
//! Exponential growth capped at `max_poll_interval`, multiplied by a jitter
//! factor so competing waiters drift apart instead of polling in lockstep.

use crate::config::LockSettings;
use std::time::Duration;

/// Lower bound of the jitter factor
pub const JITTER_MIN: f64 = 0.8;
/// Upper bound of the jitter factor
pub const JITTER_MAX: f64 = 1.2;

/// Source of jitter factors
pub trait Jitter: Send {
    fn factor(&mut self) -> f64;
}

/// Uniform factor in `[JITTER_MIN, JITTER_MAX]`
#[derive(Debug)]
pub struct UniformJitter {
    rng: fastrand::Rng,
}

impl UniformJitter {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Default for UniformJitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Jitter for UniformJitter {
    fn factor(&mut self) -> f64 {
        JITTER_MIN + self.rng.f64() * (JITTER_MAX - JITTER_MIN)
    }
}

/// Always 1.0
#[derive(Clone, Copy, Debug, Default)]
pub struct NoJitter;

impl Jitter for NoJitter {
    fn factor(&mut self) -> f64 {
        1.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub poll_interval: Duration,
    pub max_poll_interval: Duration,
    pub exponential: bool,
}

impl BackoffPolicy {
    pub fn new(poll_interval: Duration, max_poll_interval: Duration, exponential: bool) -> Self {
        Self {
            poll_interval,
            max_poll_interval: max_poll_interval.max(poll_interval),
            exponential,
        }
    }

    pub fn from_settings(settings: &LockSettings) -> Self {
        Self::new(
            settings.poll_interval,
            settings.max_poll_interval,
            settings.exponential_backoff,
        )
    }

    /// Delay before retry number `attempt` (0-based), without jitter
    pub fn base_delay(&self, attempt: u32) -> Duration {
        if !self.exponential {
            return self.poll_interval.min(self.max_poll_interval);
        }
        // 2^31 already overflows any sane interval; clamp the exponent
        let factor = 1u32 << attempt.min(31);
        self.poll_interval
            .checked_mul(factor)
            .unwrap_or(self.max_poll_interval)
            .min(self.max_poll_interval)
    }

    /// Jittered delay before retry number `attempt`, never above the cap
    pub fn delay(&self, attempt: u32, jitter: &mut impl Jitter) -> Duration {
        let base = self.base_delay(attempt);
        let factor = jitter.factor().clamp(JITTER_MIN, JITTER_MAX);
        base.mul_f64(factor).min(self.max_poll_interval)
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
