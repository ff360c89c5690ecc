// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod force_release;
pub mod health;
pub mod monitor;
pub mod run;
