//! Tests for utility functions

use rapidaid_dispatch::util::{
    whole_minutes_between, Clock, GeoPoint, ManualClock, PriorityClass, ResourceKind, MS_PER_MINUTE,
};

#[test]
fn test_priority_ranks() {
    assert_eq!(PriorityClass::Critical.rank(), 1);
    assert_eq!(PriorityClass::Low.rank(), 4);
    assert!(PriorityClass::Critical < PriorityClass::Low);
}

#[test]
fn test_priority_parses_case_insensitively() {
    assert_eq!("HIGH".parse::<PriorityClass>(), Ok(PriorityClass::High));
    assert!("urgent".parse::<PriorityClass>().is_err());
}

#[test]
fn test_room_needed_only_for_severe_classes() {
    assert!(PriorityClass::Critical.needs_room());
    assert!(PriorityClass::High.needs_room());
    assert!(!PriorityClass::Medium.needs_room());
    assert!(!PriorityClass::Low.needs_room());
}

#[test]
fn test_resource_kind_names() {
    let names: Vec<_> = ResourceKind::ALL.iter().map(|k| k.to_string()).collect();
    assert_eq!(names, ["ambulance", "doctor", "room"]);
}

#[test]
fn test_geo_point_validation() {
    assert!(GeoPoint::new(40.7, -74.0).validate().is_ok());
    assert!(GeoPoint::new(-91.0, 0.0).validate().is_err());
    assert!(GeoPoint::new(0.0, 180.5).validate().is_err());
    assert!(GeoPoint::new(f64::NAN, 0.0).validate().is_err());
}

#[test]
fn test_manual_clock() {
    let clock = ManualClock::new(1_000);
    clock.advance_minutes(2);
    assert_eq!(clock.now_ms(), 1_000 + 2 * MS_PER_MINUTE);
    clock.set_ms(5);
    assert_eq!(clock.now_ms(), 5);
}

#[test]
fn test_whole_minutes_saturate() {
    assert_eq!(whole_minutes_between(0, 119_999), 1);
    assert_eq!(whole_minutes_between(10_000, 0), 0);
}

#[test]
fn test_init_tracing_is_idempotent() {
    rapidaid_dispatch::util::init_tracing();
    rapidaid_dispatch::util::init_tracing_with_default("rapidaid_dispatch=debug");
    tracing::info!("tracing installed");
}
