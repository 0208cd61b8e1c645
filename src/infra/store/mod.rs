//! Persistence boundary for hospitals, preferences, fleets, requests and grants.
//!
//! The dispatch core only needs snapshot reads plus two atomic primitives:
//! claiming an ambulance and taking a request's allocated grants. Ledger
//! counts are not stored here; they are rebuilt from hospital capacity and
//! allocated grants on startup.

pub mod journal;
pub mod memory;

use async_trait::async_trait;

use crate::core::error::DispatchResult;
use crate::core::lifecycle::{EmergencyRequest, RequestStatus};
use crate::core::model::{Ambulance, Hospital, ResourceGrant, SchedulingPreference};
use crate::util::serde::{AmbulanceId, HospitalId, RequestId};

pub use journal::JournalStore;
pub use memory::InMemoryStore;

/// Abstraction for dispatch persistence backends.
#[async_trait]
pub trait DispatchStore: Send + Sync + 'static {
    /// Insert or replace a hospital record.
    async fn put_hospital(&self, hospital: Hospital) -> DispatchResult<()>;
    /// Fetch a hospital record.
    async fn hospital(&self, id: HospitalId) -> DispatchResult<Option<Hospital>>;
    /// All hospital records ordered by id.
    async fn hospitals(&self) -> DispatchResult<Vec<Hospital>>;
    /// Drop a hospital with its preference and fleet. Requests and grants
    /// stay as history. Returns whether the hospital existed.
    async fn remove_hospital(&self, id: HospitalId) -> DispatchResult<bool>;

    /// Insert or replace a hospital's scheduling preference.
    async fn put_preference(&self, preference: SchedulingPreference) -> DispatchResult<()>;
    /// Fetch a hospital's scheduling preference.
    async fn preference(&self, hospital_id: HospitalId) -> DispatchResult<Option<SchedulingPreference>>;

    /// Add an available ambulance to a hospital's fleet, assigning its id.
    async fn insert_ambulance(&self, hospital_id: HospitalId, vehicle_number: String) -> DispatchResult<Ambulance>;
    /// Fetch an ambulance.
    async fn ambulance(&self, id: AmbulanceId) -> DispatchResult<Option<Ambulance>>;
    /// A hospital's fleet ordered by vehicle number.
    async fn ambulances(&self, hospital_id: HospitalId) -> DispatchResult<Vec<Ambulance>>;
    /// Atomically mark an available ambulance of the hospital as assigned.
    ///
    /// With `preferred`, that ambulance must belong to the hospital and be
    /// available, otherwise a validation error is returned. Without it the
    /// first available vehicle is taken; `None` means nothing was free.
    async fn claim_ambulance(
        &self,
        hospital_id: HospitalId,
        preferred: Option<AmbulanceId>,
    ) -> DispatchResult<Option<Ambulance>>;
    /// Mark an ambulance available again. Unknown ids are ignored.
    async fn release_ambulance(&self, id: AmbulanceId) -> DispatchResult<()>;

    /// Insert or replace a request.
    async fn put_request(&self, request: EmergencyRequest) -> DispatchResult<()>;
    /// Fetch a request.
    async fn request(&self, id: RequestId) -> DispatchResult<Option<EmergencyRequest>>;
    /// Every request, oldest first.
    async fn requests(&self) -> DispatchResult<Vec<EmergencyRequest>>;

    /// A hospital's requests, oldest first.
    async fn requests_for_hospital(&self, hospital_id: HospitalId) -> DispatchResult<Vec<EmergencyRequest>> {
        Ok(self
            .requests()
            .await?
            .into_iter()
            .filter(|r| r.hospital_id == hospital_id)
            .collect())
    }

    /// A hospital's pending requests, oldest first.
    async fn pending_requests(&self, hospital_id: HospitalId) -> DispatchResult<Vec<EmergencyRequest>> {
        Ok(self
            .requests_for_hospital(hospital_id)
            .await?
            .into_iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .collect())
    }

    /// A patient's requests, newest first.
    async fn requests_for_patient(&self, patient: &str) -> DispatchResult<Vec<EmergencyRequest>> {
        let mut found: Vec<_> = self
            .requests()
            .await?
            .into_iter()
            .filter(|r| r.patient == patient)
            .collect();
        found.reverse();
        Ok(found)
    }

    /// Append grant rows.
    async fn insert_grants(&self, grants: Vec<ResourceGrant>) -> DispatchResult<()>;
    /// Every grant row of a request.
    async fn grants(&self, request_id: RequestId) -> DispatchResult<Vec<ResourceGrant>>;
    /// Atomically flip a request's allocated grants to released and return
    /// them in their released form. A second call returns nothing.
    async fn take_allocated_grants(&self, request_id: RequestId, now_ms: u128) -> DispatchResult<Vec<ResourceGrant>>;
    /// Allocated grant rows of a hospital.
    async fn allocated_grants(&self, hospital_id: HospitalId) -> DispatchResult<Vec<ResourceGrant>>;
}
