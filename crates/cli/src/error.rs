// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing errors with context, suggestions and an exit code

use gpulock_engine::Unavailable;
use std::fmt;

/// Exit code when the lock stayed held for the whole wait (EX_TEMPFAIL)
pub const EXIT_LOCK_UNAVAILABLE: u8 = 75;
/// Exit code when Redis could not be reached (EX_UNAVAILABLE)
pub const EXIT_BACKEND_UNAVAILABLE: u8 = 69;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct CliError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    pub exit_code: u8,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: u8) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            exit_code,
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// The lock stayed held for the whole wait window
    pub fn lock_unavailable(unavailable: &Unavailable) -> Self {
        let mut err = CliError::new(
            format!("Failed to acquire lock '{}'", unavailable.resource),
            EXIT_LOCK_UNAVAILABLE,
        )
        .with_context(format!(
            "Waited {} over {} attempts",
            humantime::format_duration(std::time::Duration::from_secs(
                unavailable.waited.as_secs()
            )),
            unavailable.attempts
        ));
        if let Some(holder) = &unavailable.holder {
            err = err.with_context(format!("Lock is currently held by '{}'", holder));
        }
        err.with_suggestion("Retry later or raise --max-wait")
            .with_suggestion("Check for stuck holders: gpulock health")
            .with_suggestion(format!(
                "Force release with: gpulock force-release {}",
                unavailable.resource
            ))
    }

    /// Redis could not be reached; nothing was run
    pub fn backend_unavailable(url: &str, error: impl fmt::Display) -> Self {
        CliError::new(
            "Coordination backend unavailable",
            EXIT_BACKEND_UNAVAILABLE,
        )
        .with_context(format!("Could not reach {}: {}", url, error))
        .with_suggestion("Check that Redis is running and reachable")
        .with_suggestion("Point at another server with --redis-url or GPULOCK_REDIS_URL")
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for CliError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_display() {
        let err = CliError::new("Something went wrong", 1)
            .with_context("First context")
            .with_context("Second context")
            .with_suggestion("Try this")
            .with_suggestion("Or this");

        let output = format!("{}", err);
        assert!(output.contains("error: Something went wrong"));
        assert!(output.contains("-> First context"));
        assert!(output.contains("-> Second context"));
        assert!(output.contains("1. Try this"));
        assert!(output.contains("2. Or this"));
    }

    #[test]
    fn test_lock_unavailable_error() {
        let err = CliError::lock_unavailable(&Unavailable {
            resource: "gpu:0".to_string(),
            waited: Duration::from_millis(300_400),
            attempts: 12,
            holder: Some("worker-7".to_string()),
        });
        let output = format!("{}", err);
        assert_eq!(err.exit_code, EXIT_LOCK_UNAVAILABLE);
        assert!(output.contains("'gpu:0'"));
        assert!(output.contains("Waited 5m over 12 attempts"));
        assert!(output.contains("'worker-7'"));
        assert!(output.contains("gpulock force-release gpu:0"));
    }

    #[test]
    fn test_backend_unavailable_error() {
        let err = CliError::backend_unavailable("redis://127.0.0.1:1", "connection refused");
        assert_eq!(err.exit_code, EXIT_BACKEND_UNAVAILABLE);
        assert!(format!("{}", err).contains("redis://127.0.0.1:1: connection refused"));
    }
}
