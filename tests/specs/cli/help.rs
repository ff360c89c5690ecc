//! Help and usage specs

use crate::prelude::*;

#[test]
fn help_lists_every_command() {
    gpulock()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("run")
                .and(predicate::str::contains("monitor"))
                .and(predicate::str::contains("health"))
                .and(predicate::str::contains("force-release")),
        );
}

#[test]
fn run_help_shows_wait_and_stats_flags() {
    gpulock()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--max-wait")
                .and(predicate::str::contains("--stats"))
                .and(predicate::str::contains("--redis-url")),
        );
}

#[test]
fn monitor_help_shows_once_and_log_file() {
    gpulock()
        .args(["monitor", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--once").and(predicate::str::contains("--log-file")));
}

#[test]
fn version_names_the_binary() {
    gpulock()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("gpulock "));
}
