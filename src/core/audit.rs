//! Audit sink implementations.
//!
//! Every allocate, release and lifecycle transition produces one
//! [`AuditEvent`]. Sinks are synchronous and cheap; the dispatcher records
//! after the store round-trip, never while holding a ledger lock.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::clock::now_ms;
use crate::util::serde::{HospitalId, RequestId};

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: Uuid,
    /// Related request, if any.
    pub request_id: Option<RequestId>,
    /// Hospital identifier.
    pub hospital_id: HospitalId,
    /// Action taken (create, allocate, release, start, complete, cancel, reject, policy, resize).
    pub action: String,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Sink that emits each event as a structured `tracing` record on the
/// `rapidaid_dispatch::audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&mut self, event: AuditEvent) {
        tracing::info!(
            target: "rapidaid_dispatch::audit",
            event_id = %event.event_id,
            request_id = ?event.request_id,
            hospital_id = event.hospital_id,
            action = %event.action,
            detail = ?event.detail,
            "audit"
        );
    }
}

/// Helper to build an audit event stamped with a fresh id and the wall clock.
pub fn build_audit_event(
    request_id: Option<RequestId>,
    hospital_id: HospitalId,
    action: impl Into<String>,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: Uuid::new_v4(),
        request_id,
        hospital_id,
        action: action.into(),
        created_at_ms: now_ms(),
        detail,
    }
}
