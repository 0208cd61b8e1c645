//! Tests for error types

use rapidaid_dispatch::core::{DispatchError, RequestStatus};

#[test]
fn test_validation_error() {
    let err = DispatchError::Validation("symptoms must not be empty".to_string());
    assert_eq!(format!("{}", err), "validation failed: symptoms must not be empty");
    assert_eq!(err.code(), "validation");
}

#[test]
fn test_not_found_error() {
    let err = DispatchError::not_found("hospital", 42);
    assert_eq!(format!("{}", err), "hospital not found: 42");
    assert_eq!(err.code(), "not_found");
}

#[test]
fn test_invalid_transition_error() {
    let err = DispatchError::InvalidTransition {
        from: RequestStatus::Pending,
        to: RequestStatus::Completed,
    };
    assert_eq!(format!("{}", err), "invalid transition from pending to completed");
}

#[test]
fn test_unknown_policy_error() {
    let err = DispatchError::UnknownPolicy("lifo".to_string());
    assert_eq!(format!("{}", err), "unknown scheduling policy: lifo");
}

#[test]
fn test_store_unavailable_error() {
    let err = DispatchError::StoreUnavailable("connection refused".to_string());
    assert_eq!(format!("{}", err), "store unavailable: connection refused");
    assert!(!err.is_retryable());
    assert!(!err.is_no_capacity());
}

#[test]
fn test_conflict_is_retryable() {
    let err = DispatchError::ConcurrentConflict("hospital 1 ledger is busy".to_string());
    assert!(err.is_retryable());
    assert_eq!(err.code(), "conflict");
}
