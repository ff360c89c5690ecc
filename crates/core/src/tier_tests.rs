use super::*;
use yare::parameterized;

fn tiers() -> TimeoutTiers {
    TimeoutTiers::new(
        Duration::from_secs(300),
        Duration::from_secs(600),
        Duration::from_secs(7200),
    )
}

#[parameterized(
    fresh = { 0, TimeoutTier::Normal },
    just_below_warning = { 299, TimeoutTier::Normal },
    at_warning = { 300, TimeoutTier::Warning },
    between_warning_and_soft = { 450, TimeoutTier::Warning },
    at_soft = { 600, TimeoutTier::Soft },
    long_running = { 700, TimeoutTier::Soft },
    just_below_hard = { 7199, TimeoutTier::Soft },
    at_hard = { 7200, TimeoutTier::Hard },
    way_past_hard = { 86_400, TimeoutTier::Hard },
)]
fn classify_by_age(age_secs: u64, expected: TimeoutTier) {
    assert_eq!(tiers().classify(Duration::from_secs(age_secs)), expected);
}

#[test]
fn normal_tier_takes_no_action() {
    assert_eq!(decide(TimeoutTier::Normal, None), MonitorAction::None);
    assert_eq!(
        decide(TimeoutTier::Normal, Some(Liveness::Missing)),
        MonitorAction::None
    );
}

#[test]
fn warning_tier_only_warns() {
    assert_eq!(decide(TimeoutTier::Warning, None), MonitorAction::Warn);
    assert_eq!(
        decide(TimeoutTier::Warning, Some(Liveness::Missing)),
        MonitorAction::Warn
    );
}

#[test]
fn soft_tier_spares_live_holders() {
    let alive = Liveness::Alive {
        age: Duration::from_secs(3),
    };
    assert_eq!(decide(TimeoutTier::Soft, Some(alive)), MonitorAction::None);
}

#[parameterized(
    stale = { Some(Liveness::Stale { age: Duration::from_secs(45) }) },
    missing = { Some(Liveness::Missing) },
    unknown = { None },
)]
fn soft_tier_evicts_dead_holders(liveness: Option<Liveness>) {
    assert_eq!(
        decide(TimeoutTier::Soft, liveness),
        MonitorAction::ForceRelease
    );
}

#[test]
fn hard_tier_ignores_heartbeat() {
    let alive = Liveness::Alive {
        age: Duration::from_secs(1),
    };
    assert_eq!(
        decide(TimeoutTier::Hard, Some(alive)),
        MonitorAction::ForceRelease
    );
    assert_eq!(decide(TimeoutTier::Hard, None), MonitorAction::ForceRelease);
}

#[test]
fn liveness_boundary_is_inclusive() {
    let timeout = Duration::from_secs(20);
    assert!(Liveness::from_age(Duration::from_secs(20), timeout).is_alive());
    assert!(!Liveness::from_age(Duration::from_secs(21), timeout).is_alive());
}

#[test]
fn only_soft_tier_needs_liveness() {
    assert!(TimeoutTier::Soft.needs_liveness());
    assert!(!TimeoutTier::Hard.needs_liveness());
    assert!(!TimeoutTier::Warning.needs_liveness());
}

#[test]
fn tiers_deserialize_from_humantime() {
    let tiers: TimeoutTiers =
        toml::from_str("warning = \"5m\"\nsoft = \"10m\"\nhard = \"2h\"\n").unwrap();
    assert_eq!(tiers, TimeoutTiers::default());
}
