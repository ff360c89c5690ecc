//! Argument and configuration error specs

use crate::prelude::*;

#[test]
fn run_without_a_command_is_a_usage_error() {
    gpulock().args(["run", "gpu:0"]).assert().code(2);
}

#[test]
fn unparseable_max_wait_is_a_usage_error() {
    gpulock()
        .args(["run", "gpu:0", "--max-wait", "soon", "--", "true"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--max-wait"));
}

#[test]
fn unknown_format_is_a_usage_error() {
    gpulock()
        .args(["health", "--format", "yaml"])
        .assert()
        .code(2);
}

#[test]
fn missing_config_file_is_reported() {
    let project = Project::empty();
    project
        .gpulock()
        .args(["--config", "missing.toml", "health"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to load missing.toml"));
}

#[test]
fn misordered_tiers_are_rejected_before_connecting() {
    let project = Project::empty();
    let config = project.file(
        "gpulock.toml",
        r#"
[backend]
url = "redis://127.0.0.1:1"

[lock.tiers]
warning = "30m"
soft = "10m"
hard = "2h"
"#,
    );
    let marker = project.join("ran");

    project
        .gpulock()
        .arg("--config")
        .arg(&config)
        .args(["run", "gpu:0", "--", "touch"])
        .arg(&marker)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("warning <= soft <= hard"));
    assert!(!marker.exists());
}

#[test]
fn malformed_toml_is_rejected() {
    let project = Project::empty();
    let config = project.file("gpulock.toml", "[lock\npoll_interval = ");

    project
        .gpulock()
        .arg("--config")
        .arg(&config)
        .arg("health")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to parse config"));
}
