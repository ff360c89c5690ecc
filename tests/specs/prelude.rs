//! Shared helpers for CLI specs

#![allow(dead_code)]

pub use predicates::prelude::*;

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Nothing listens on port 1, so connecting fails immediately
pub const UNREACHABLE_REDIS: &str = "redis://127.0.0.1:1";

/// Exit code for an unreachable coordination backend
pub const EXIT_BACKEND_UNAVAILABLE: i32 = 69;

/// Scratch directory for config files and command side effects
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write a file relative to the project root
    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    /// The gpulock binary, run from the project root
    pub fn gpulock(&self) -> Command {
        let mut cmd = gpulock();
        cmd.current_dir(self.path());
        cmd
    }
}

/// The gpulock binary with a clean environment
pub fn gpulock() -> Command {
    let mut cmd = Command::cargo_bin("gpulock").unwrap();
    cmd.env_remove("GPULOCK_CONFIG")
        .env_remove("GPULOCK_REDIS_URL")
        .env("RUST_LOG", "warn");
    cmd
}
