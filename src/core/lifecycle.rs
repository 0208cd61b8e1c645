//! Emergency request lifecycle.
//!
//! ```text
//! pending ──► assigned ──► in_progress ──► completed
//!    │  │         │              │
//!    │  │         └──────┬───────┘
//!    │  └──► rejected    ▼
//!    └─────────────► cancelled
//! ```
//!
//! The methods on [`EmergencyRequest`] are the only code that changes a
//! request's status. They validate the move, then stamp the timestamps so
//! that `assigned_at` is set exactly while the request is assigned, in
//! progress or completed, and `completed_at` exactly when it is completed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::{DispatchError, DispatchResult};
use crate::util::serde::{AmbulanceId, GeoPoint, HospitalId, PatientRef, PriorityClass, RequestId};

/// Status of a request in the dispatch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Waiting for resources.
    Pending,
    /// Resources granted, ambulance bound.
    Assigned,
    /// Crew en route or treating.
    InProgress,
    /// Finished; resources released.
    Completed,
    /// Withdrawn by the patient or an operator.
    Cancelled,
    /// Declined by the hospital.
    Rejected,
}

impl RequestStatus {
    /// Lowercase name as stored and displayed.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
        }
    }

    /// No further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Rejected)
    }

    /// Holds ledger units.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Assigned | Self::InProgress)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Assigned | Self::Cancelled | Self::Rejected)
                | (Self::Assigned, Self::InProgress | Self::Completed | Self::Cancelled)
                | (Self::InProgress, Self::Completed | Self::Cancelled)
        )
    }

    /// `Ok` if the move is legal, otherwise [`DispatchError::InvalidTransition`].
    pub fn check_transition(self, next: Self) -> DispatchResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DispatchError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An emergency-care request routed to one hospital.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyRequest {
    /// Request identifier.
    pub id: RequestId,
    /// Patient reference.
    pub patient: PatientRef,
    /// Target hospital.
    pub hospital_id: HospitalId,
    /// Free-text symptoms as submitted.
    pub symptoms: String,
    /// Severity assigned at creation.
    pub priority: PriorityClass,
    /// Patient coordinates.
    pub location: GeoPoint,
    /// Kilometers to the hospital, fixed at creation.
    pub distance_km: f64,
    /// Estimated arrival in minutes, fixed at creation.
    pub estimated_arrival_minutes: u32,
    /// Current lifecycle state.
    pub status: RequestStatus,
    /// Bound ambulance, if any.
    pub ambulance_id: Option<AmbulanceId>,
    /// Creation time.
    pub created_at_ms: u128,
    /// Set while assigned, in progress or completed.
    pub assigned_at_ms: Option<u128>,
    /// Set once completed.
    pub completed_at_ms: Option<u128>,
    /// Set once cancelled or rejected.
    pub closed_at_ms: Option<u128>,
    /// Why the request was cancelled or rejected.
    pub close_reason: Option<String>,
}

impl EmergencyRequest {
    /// `pending → assigned`.
    pub fn mark_assigned(&mut self, ambulance: Option<AmbulanceId>, now_ms: u128) -> DispatchResult<()> {
        self.status.check_transition(RequestStatus::Assigned)?;
        self.status = RequestStatus::Assigned;
        self.ambulance_id = ambulance;
        self.assigned_at_ms = Some(now_ms);
        Ok(())
    }

    /// `assigned → in_progress`.
    pub fn mark_in_progress(&mut self) -> DispatchResult<()> {
        self.status.check_transition(RequestStatus::InProgress)?;
        self.status = RequestStatus::InProgress;
        Ok(())
    }

    /// `assigned | in_progress → completed`.
    pub fn mark_completed(&mut self, now_ms: u128) -> DispatchResult<()> {
        self.status.check_transition(RequestStatus::Completed)?;
        self.status = RequestStatus::Completed;
        self.completed_at_ms = Some(now_ms);
        Ok(())
    }

    /// `pending | assigned | in_progress → cancelled`.
    pub fn mark_cancelled(&mut self, reason: Option<String>, now_ms: u128) -> DispatchResult<()> {
        self.status.check_transition(RequestStatus::Cancelled)?;
        self.status = RequestStatus::Cancelled;
        self.assigned_at_ms = None;
        self.closed_at_ms = Some(now_ms);
        self.close_reason = reason;
        Ok(())
    }

    /// `pending → rejected`.
    pub fn mark_rejected(&mut self, reason: String, now_ms: u128) -> DispatchResult<()> {
        self.status.check_transition(RequestStatus::Rejected)?;
        self.status = RequestStatus::Rejected;
        self.closed_at_ms = Some(now_ms);
        self.close_reason = Some(reason);
        Ok(())
    }

    /// Timestamp invariants hold for the current status.
    #[must_use]
    pub const fn timestamps_consistent(&self) -> bool {
        let assigned = matches!(
            self.status,
            RequestStatus::Assigned | RequestStatus::InProgress | RequestStatus::Completed
        );
        let completed = matches!(self.status, RequestStatus::Completed);
        self.assigned_at_ms.is_some() == assigned && self.completed_at_ms.is_some() == completed
    }

    /// Whole minutes from creation to completion.
    #[must_use]
    pub fn response_minutes(&self) -> Option<u64> {
        self.completed_at_ms
            .map(|done| crate::util::clock::whole_minutes_between(self.created_at_ms, done))
    }
}
