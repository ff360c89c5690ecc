//! Fail-closed behavior when Redis cannot be reached

use crate::prelude::*;

#[test]
fn run_never_starts_the_command_without_the_backend() {
    let project = Project::empty();
    let marker = project.join("ran");

    project
        .gpulock()
        .args(["--redis-url", UNREACHABLE_REDIS, "run", "gpu:0", "--", "touch"])
        .arg(&marker)
        .assert()
        .code(EXIT_BACKEND_UNAVAILABLE)
        .stderr(
            predicate::str::contains("Coordination backend unavailable")
                .and(predicate::str::contains(UNREACHABLE_REDIS)),
        );
    assert!(!marker.exists());
}

#[test]
fn redis_url_can_come_from_the_environment() {
    let project = Project::empty();
    let marker = project.join("ran");

    project
        .gpulock()
        .env("GPULOCK_REDIS_URL", UNREACHABLE_REDIS)
        .args(["run", "gpu:0", "--", "touch"])
        .arg(&marker)
        .assert()
        .code(EXIT_BACKEND_UNAVAILABLE);
    assert!(!marker.exists());
}

#[test]
fn health_fails_closed() {
    gpulock()
        .args(["--redis-url", UNREACHABLE_REDIS, "health"])
        .assert()
        .code(EXIT_BACKEND_UNAVAILABLE);
}

#[test]
fn single_monitor_scan_fails_closed() {
    gpulock()
        .args(["--redis-url", UNREACHABLE_REDIS, "monitor", "--once"])
        .assert()
        .code(EXIT_BACKEND_UNAVAILABLE);
}

#[test]
fn force_release_fails_closed() {
    gpulock()
        .args(["--redis-url", UNREACHABLE_REDIS, "force-release", "gpu:0"])
        .assert()
        .code(EXIT_BACKEND_UNAVAILABLE)
        .stderr(predicate::str::contains("suggestions:"));
}
