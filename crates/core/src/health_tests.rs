use super::*;

const MIN: u64 = 60;

fn observe(resource: &str, age_secs: Option<u64>, heartbeat: Liveness) -> LockObservation {
    LockObservation {
        resource: resource.to_string(),
        owner: format!("host:1:{}", resource),
        age: age_secs.map(Duration::from_secs),
        heartbeat,
    }
}

fn alive() -> Liveness {
    Liveness::Alive {
        age: Duration::from_secs(2),
    }
}

fn report(observations: Vec<LockObservation>) -> HealthReport {
    let tiers = TimeoutTiers::default();
    HealthReport::from_locks(observations, &tiers, tiers.soft)
}

#[test]
fn no_locks_is_healthy() {
    let report = report(vec![]);
    assert_eq!(report.status, HealthStatus::Healthy);
    assert!(report.held_locks.is_empty());
}

#[test]
fn fresh_locks_are_healthy() {
    let report = report(vec![
        observe("gpu:0", Some(30), alive()),
        observe("gpu:1", Some(6 * MIN), alive()),
    ]);
    assert_eq!(report.status, HealthStatus::Healthy);
    assert_eq!(report.held_locks[1].tier, TimeoutTier::Warning);
    assert!(report
        .held_locks
        .iter()
        .all(|l| l.class == HeldLockClass::Healthy));
}

#[test]
fn long_held_lock_is_a_warning() {
    let report = report(vec![
        observe("gpu:0", Some(30), alive()),
        observe("gpu:1", Some(11 * MIN), alive()),
    ]);
    assert_eq!(report.status, HealthStatus::Warning);
    assert_eq!(report.long_held_locks.len(), 1);
    assert_eq!(report.long_held_locks[0].resource, "gpu:1");
    assert!(report.zombie_locks.is_empty());
    assert_eq!(report.held_locks[1].class, HeldLockClass::LongHeld);
}

#[test]
fn missing_heartbeat_is_a_zombie() {
    let report = report(vec![
        observe("gpu:0", Some(30), Liveness::Missing),
        observe("gpu:1", Some(11 * MIN), alive()),
    ]);
    assert_eq!(report.status, HealthStatus::Unhealthy);
    let zombies: Vec<_> = report.zombie_locks.iter().map(|l| l.resource.as_str()).collect();
    let long_held: Vec<_> = report.long_held_locks.iter().map(|l| l.resource.as_str()).collect();
    assert_eq!(zombies, vec!["gpu:0"]);
    assert_eq!(long_held, vec!["gpu:1"]);
    assert_eq!(report.held_locks.len(), 2);
}

#[test]
fn stale_heartbeat_is_not_a_zombie() {
    let stale = Liveness::Stale {
        age: Duration::from_secs(90),
    };
    let report = report(vec![observe("gpu:0", Some(30), stale)]);
    assert_eq!(report.status, HealthStatus::Healthy);
}

#[test]
fn lock_without_ttl_is_long_held_at_hard_tier() {
    let report = report(vec![observe("gpu:7", None, alive())]);
    assert_eq!(report.status, HealthStatus::Warning);
    assert_eq!(report.held_locks[0].tier, TimeoutTier::Hard);
    assert_eq!(report.held_locks[0].class, HeldLockClass::LongHeld);
}

#[test]
fn custom_threshold_applies() {
    let tiers = TimeoutTiers::default();
    let report = HealthReport::from_locks(
        vec![observe("gpu:0", Some(2 * MIN), alive())],
        &tiers,
        Duration::from_secs(MIN),
    );
    assert_eq!(report.status, HealthStatus::Warning);
}

#[test]
fn locks_are_sorted_by_resource() {
    let report = report(vec![
        observe("gpu:3", Some(1), alive()),
        observe("gpu:1", Some(1), alive()),
    ]);
    let names: Vec<_> = report.held_locks.iter().map(|l| l.resource.as_str()).collect();
    assert_eq!(names, vec!["gpu:1", "gpu:3"]);
}

#[test]
fn serializes_status_in_snake_case() {
    let report = report(vec![observe("gpu:0", Some(30), Liveness::Missing)]);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "unhealthy");
    assert_eq!(json["held_locks"][0]["class"], "zombie");
    assert_eq!(json["held_locks"][0]["heartbeat"]["state"], "missing");
    assert_eq!(json["zombie_locks"][0]["resource"], "gpu:0");
    assert_eq!(json["long_held_locks"], serde_json::json!([]));
}

#[test]
fn display_lists_each_lock() {
    let report = report(vec![observe("gpu:0", Some(11 * MIN), alive())]);
    let text = report.to_string();
    assert!(text.starts_with("status: warning (1 held, 0 zombie, 1 long-held)"));
    assert!(text.contains("gpu:0"));
    assert!(text.contains("age 11m"));
    assert!(text.contains("tier soft"));
    assert!(text.contains("[long-held]"));
}
