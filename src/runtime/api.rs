//! API-facing request/response models.

use serde::{Deserialize, Serialize};

use crate::core::{
    DispatchError, Dispatcher, NewEmergencyRequest, RequestStatus,
};
use crate::infra::store::DispatchStore;
use crate::util::serde::{GeoPoint, HospitalId, PriorityClass, RequestId};

/// Emergency submission payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencySubmission {
    /// Patient reference.
    pub patient: String,
    /// Free-text symptoms.
    pub symptoms: String,
    /// Patient latitude.
    pub latitude: f64,
    /// Patient longitude.
    pub longitude: f64,
    /// Target hospital.
    pub hospital_id: HospitalId,
}

impl From<EmergencySubmission> for NewEmergencyRequest {
    fn from(submission: EmergencySubmission) -> Self {
        Self {
            patient: submission.patient,
            symptoms: submission.symptoms,
            location: GeoPoint::new(submission.latitude, submission.longitude),
            hospital_id: submission.hospital_id,
        }
    }
}

/// Receipt returned for an accepted submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// Request identifier.
    pub request_id: RequestId,
    /// Current status.
    pub status: RequestStatus,
    /// Assigned priority class.
    pub priority: PriorityClass,
    /// Kilometers to the hospital.
    pub distance_km: f64,
    /// Estimated arrival in minutes.
    pub estimated_arrival_minutes: u32,
    /// Zero-based position in the hospital's queue at submission time.
    pub queue_position: Option<usize>,
}

/// Error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable kind.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Whether retrying the same call may succeed.
    pub retryable: bool,
}

impl From<&DispatchError> for ErrorBody {
    fn from(err: &DispatchError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            retryable: err.is_retryable() || err.is_no_capacity(),
        }
    }
}

impl From<DispatchError> for ErrorBody {
    fn from(err: DispatchError) -> Self {
        Self::from(&err)
    }
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
    /// Hospitals tracked by the ledger.
    pub hospitals: usize,
}

/// Create a request from a submission and report where it sits in the queue.
pub async fn submit_emergency<S: DispatchStore>(
    dispatcher: &Dispatcher<S>,
    submission: EmergencySubmission,
) -> Result<SubmissionReceipt, ErrorBody> {
    let request = dispatcher.create_request(submission.into()).await?;
    let queue_position = dispatcher
        .queue(request.hospital_id)
        .await?
        .iter()
        .position(|entry| entry.request_id == request.id);
    Ok(SubmissionReceipt {
        request_id: request.id,
        status: request.status,
        priority: request.priority,
        distance_km: request.distance_km,
        estimated_arrival_minutes: request.estimated_arrival_minutes,
        queue_position,
    })
}

/// Report liveness; fails when the store is unreachable.
pub async fn health<S: DispatchStore>(dispatcher: &Dispatcher<S>) -> Result<Health, ErrorBody> {
    dispatcher.store().hospitals().await?;
    Ok(Health {
        ok: true,
        hospitals: dispatcher.ledger().hospital_ids().len(),
    })
}
