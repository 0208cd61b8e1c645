//! Shared test doubles
//!
//! `FaultyStore` wraps the in-memory store and fails chosen operations on
//! demand with `StoreUnavailable`, so rollback paths can be driven directly.

#![allow(dead_code)]

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;

use rapidaid_dispatch::core::{
    Ambulance, DispatchError, DispatchResult, EmergencyRequest, Hospital, ResourceGrant, SchedulingPreference,
};
use rapidaid_dispatch::infra::{DispatchStore, InMemoryStore};
use rapidaid_dispatch::util::{AmbulanceId, HospitalId, RequestId};

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    PutHospital,
    ListHospitals,
    RemoveHospital,
    ClaimAmbulance,
    ReleaseAmbulance,
    PutRequest,
    InsertGrants,
}

#[derive(Default)]
pub struct FaultyStore {
    inner: InMemoryStore,
    faults: Mutex<HashSet<Fault>>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, fault: Fault) {
        self.faults.lock().insert(fault);
    }

    pub fn heal(&self, fault: Fault) {
        self.faults.lock().remove(&fault);
    }

    fn check(&self, fault: Fault) -> DispatchResult<()> {
        if self.faults.lock().contains(&fault) {
            return Err(DispatchError::StoreUnavailable(format!("{fault:?} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl DispatchStore for FaultyStore {
    async fn put_hospital(&self, hospital: Hospital) -> DispatchResult<()> {
        self.check(Fault::PutHospital)?;
        self.inner.put_hospital(hospital).await
    }

    async fn hospital(&self, id: HospitalId) -> DispatchResult<Option<Hospital>> {
        self.inner.hospital(id).await
    }

    async fn hospitals(&self) -> DispatchResult<Vec<Hospital>> {
        self.check(Fault::ListHospitals)?;
        self.inner.hospitals().await
    }

    async fn remove_hospital(&self, id: HospitalId) -> DispatchResult<bool> {
        self.check(Fault::RemoveHospital)?;
        self.inner.remove_hospital(id).await
    }

    async fn put_preference(&self, preference: SchedulingPreference) -> DispatchResult<()> {
        self.inner.put_preference(preference).await
    }

    async fn preference(&self, hospital_id: HospitalId) -> DispatchResult<Option<SchedulingPreference>> {
        self.inner.preference(hospital_id).await
    }

    async fn insert_ambulance(&self, hospital_id: HospitalId, vehicle_number: String) -> DispatchResult<Ambulance> {
        self.inner.insert_ambulance(hospital_id, vehicle_number).await
    }

    async fn ambulance(&self, id: AmbulanceId) -> DispatchResult<Option<Ambulance>> {
        self.inner.ambulance(id).await
    }

    async fn ambulances(&self, hospital_id: HospitalId) -> DispatchResult<Vec<Ambulance>> {
        self.inner.ambulances(hospital_id).await
    }

    async fn claim_ambulance(
        &self,
        hospital_id: HospitalId,
        preferred: Option<AmbulanceId>,
    ) -> DispatchResult<Option<Ambulance>> {
        self.check(Fault::ClaimAmbulance)?;
        self.inner.claim_ambulance(hospital_id, preferred).await
    }

    async fn release_ambulance(&self, id: AmbulanceId) -> DispatchResult<()> {
        self.check(Fault::ReleaseAmbulance)?;
        self.inner.release_ambulance(id).await
    }

    async fn put_request(&self, request: EmergencyRequest) -> DispatchResult<()> {
        self.check(Fault::PutRequest)?;
        self.inner.put_request(request).await
    }

    async fn request(&self, id: RequestId) -> DispatchResult<Option<EmergencyRequest>> {
        self.inner.request(id).await
    }

    async fn requests(&self) -> DispatchResult<Vec<EmergencyRequest>> {
        self.inner.requests().await
    }

    async fn insert_grants(&self, grants: Vec<ResourceGrant>) -> DispatchResult<()> {
        self.check(Fault::InsertGrants)?;
        self.inner.insert_grants(grants).await
    }

    async fn grants(&self, request_id: RequestId) -> DispatchResult<Vec<ResourceGrant>> {
        self.inner.grants(request_id).await
    }

    async fn take_allocated_grants(&self, request_id: RequestId, now_ms: u128) -> DispatchResult<Vec<ResourceGrant>> {
        self.inner.take_allocated_grants(request_id, now_ms).await
    }

    async fn allocated_grants(&self, hospital_id: HospitalId) -> DispatchResult<Vec<ResourceGrant>> {
        self.inner.allocated_grants(hospital_id).await
    }
}
