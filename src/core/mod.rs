//! Dispatch core: classification, queue policies, capacity accounting and
//! the request lifecycle.

pub mod admission;
pub mod audit;
pub mod classifier;
pub mod dispatcher;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod model;
pub mod queue_policy;

pub use admission::{requested_resources, AdmissionController, Safety};
pub use audit::{build_audit_event, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use classifier::{distance, distance_between, estimated_arrival_minutes, Classifier};
pub use dispatcher::Dispatcher;
pub use error::{AppResult, DispatchError, DispatchResult};
pub use ledger::{PoolSnapshot, ResourceLedger};
pub use lifecycle::{EmergencyRequest, RequestStatus};
pub use model::{
    default_priority_weights, Ambulance, AmbulanceStatus, GrantStatus, Hospital, HospitalRegistration,
    HospitalStatus, HospitalUpdate, NewEmergencyRequest, PriorityWeights, ResourceGrant, SchedulingPreference,
    SystemOverview,
};
pub use queue_policy::{response_ratio, QueueEntry, QueuePolicy};
