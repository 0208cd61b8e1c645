//! Tests for configuration validation

use rapidaid_dispatch::config::{AdmissionConfig, DispatchConfig, SchedulingConfig};

#[test]
fn test_dispatch_config_defaults() {
    let cfg = DispatchConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.scheduling.default_policy, "priority");
    assert_eq!(cfg.admission.max_conflict_retries, 2);
    assert_eq!(cfg.admission.lock_timeout_ms, 250);
    assert!((cfg.minutes_per_km - 3.0).abs() < f64::EPSILON);
}

#[test]
fn test_dispatch_config_from_partial_json() {
    let cfg = DispatchConfig::from_json_str(
        r#"{
            "minutes_per_km": 2.5,
            "scheduling": { "default_policy": "HRRN" },
            "hospitals": [
                {
                    "id": 1,
                    "name": "General",
                    "location": { "latitude": 40.71, "longitude": -74.0 },
                    "total_ambulances": 3,
                    "ambulances": ["AMB-1", "AMB-2"]
                }
            ]
        }"#,
    )
    .expect("valid config");

    assert!((cfg.minutes_per_km - 2.5).abs() < f64::EPSILON);
    assert_eq!(cfg.scheduling.default_policy, "HRRN");
    assert_eq!(cfg.scheduling.default_weights.len(), 4);
    assert_eq!(cfg.hospitals[0].total_ambulances, 3);
    assert_eq!(cfg.hospitals[0].total_doctors, 10);
    assert_eq!(cfg.hospitals[0].ambulances.len(), 2);
}

#[test]
fn test_dispatch_config_rejects_duplicate_hospitals() {
    let hospital = r#"{ "id": 7, "name": "A", "location": { "latitude": 0.0, "longitude": 0.0 } }"#;
    let err = DispatchConfig::from_json_str(&format!(r#"{{ "hospitals": [{hospital}, {hospital}] }}"#))
        .unwrap_err();
    assert!(err.contains("duplicate hospital id 7"), "{err}");
}

#[test]
fn test_dispatch_config_rejects_bad_coordinates() {
    let err = DispatchConfig::from_json_str(
        r#"{ "hospitals": [{ "id": 1, "name": "A", "location": { "latitude": 91.0, "longitude": 0.0 } }] }"#,
    )
    .unwrap_err();
    assert!(err.contains("hospital `1` invalid"), "{err}");
}

#[test]
fn test_dispatch_config_invalid_minutes_per_km() {
    let cfg = DispatchConfig {
        minutes_per_km: 0.0,
        ..DispatchConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_scheduling_config_unknown_policy() {
    let cfg = SchedulingConfig {
        default_policy: "lifo".to_string(),
        ..SchedulingConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_admission_config_zero_timeout() {
    let cfg = AdmissionConfig {
        max_conflict_retries: 0,
        lock_timeout_ms: 0,
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_from_json_str_parse_error() {
    let err = DispatchConfig::from_json_str("{ not json").unwrap_err();
    assert!(err.starts_with("parse error"), "{err}");
}
