//! Tests for audit sink

use rapidaid_dispatch::core::{build_audit_event, AuditSink, InMemoryAuditSink, TracingAuditSink};
use uuid::Uuid;

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);
    let request_id = Uuid::new_v4();

    let event = build_audit_event(Some(request_id), 1, "allocate", Some("ambulancex1".to_string()));
    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].event_id, event.event_id);
    assert_eq!(events[0].request_id, Some(request_id));
    assert_eq!(events[0].hospital_id, 1);
    assert_eq!(events[0].action, "allocate");
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    for action in ["create", "allocate", "assign"] {
        sink.record(build_audit_event(None, 1, action, None));
    }

    let actions: Vec<_> = sink.events().into_iter().map(|e| e.action).collect();
    assert_eq!(actions, ["allocate", "assign"]);
}

#[test]
fn test_audit_event_ids_are_unique() {
    let a = build_audit_event(None, 1, "policy", None);
    let b = build_audit_event(None, 1, "policy", None);
    assert_ne!(a.event_id, b.event_id);
}

#[test]
fn test_tracing_sink_accepts_events() {
    let mut sink = TracingAuditSink;
    sink.record(build_audit_event(None, 3, "resize", Some("room=4".to_string())));
}
