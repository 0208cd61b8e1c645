//! In-memory store for development, tests and as the journal's working set.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::DispatchStore;
use crate::core::error::{DispatchError, DispatchResult};
use crate::core::lifecycle::EmergencyRequest;
use crate::core::model::{
    Ambulance, AmbulanceStatus, GrantStatus, Hospital, ResourceGrant, SchedulingPreference,
};
use crate::util::serde::{AmbulanceId, HospitalId, RequestId};

#[derive(Default)]
struct State {
    hospitals: BTreeMap<HospitalId, Hospital>,
    preferences: HashMap<HospitalId, SchedulingPreference>,
    ambulances: BTreeMap<AmbulanceId, Ambulance>,
    next_ambulance_id: AmbulanceId,
    requests: HashMap<RequestId, EmergencyRequest>,
    /// Insertion order of `requests`.
    request_order: Vec<RequestId>,
    grants: Vec<ResourceGrant>,
}

/// Store keeping every table in memory behind one `RwLock`.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn put_hospital_now(&self, hospital: Hospital) {
        self.state.write().hospitals.insert(hospital.id, hospital);
    }

    pub(crate) fn has_hospital_now(&self, id: HospitalId) -> bool {
        self.state.read().hospitals.contains_key(&id)
    }

    pub(crate) fn remove_hospital_now(&self, id: HospitalId) -> bool {
        let mut state = self.state.write();
        state.preferences.remove(&id);
        state.ambulances.retain(|_, a| a.hospital_id != id);
        state.hospitals.remove(&id).is_some()
    }

    pub(crate) fn put_preference_now(&self, preference: SchedulingPreference) {
        self.state
            .write()
            .preferences
            .insert(preference.hospital_id, preference);
    }

    pub(crate) fn put_ambulance_now(&self, ambulance: Ambulance) {
        let mut state = self.state.write();
        state.next_ambulance_id = state.next_ambulance_id.max(ambulance.id);
        state.ambulances.insert(ambulance.id, ambulance);
    }

    pub(crate) fn insert_ambulance_now(&self, hospital_id: HospitalId, vehicle_number: String) -> Ambulance {
        let mut state = self.state.write();
        state.next_ambulance_id += 1;
        let ambulance = Ambulance {
            id: state.next_ambulance_id,
            hospital_id,
            vehicle_number,
            status: AmbulanceStatus::Available,
        };
        state.ambulances.insert(ambulance.id, ambulance.clone());
        ambulance
    }

    pub(crate) fn claim_ambulance_now(
        &self,
        hospital_id: HospitalId,
        preferred: Option<AmbulanceId>,
    ) -> DispatchResult<Option<Ambulance>> {
        let mut state = self.state.write();
        let candidate = match preferred {
            Some(id) => {
                let ambulance = state
                    .ambulances
                    .get_mut(&id)
                    .ok_or_else(|| DispatchError::not_found("ambulance", id))?;
                if ambulance.hospital_id != hospital_id {
                    return Err(DispatchError::Validation(format!(
                        "ambulance {id} does not belong to hospital {hospital_id}"
                    )));
                }
                if ambulance.status != AmbulanceStatus::Available {
                    return Err(DispatchError::Validation(format!("ambulance {id} is not available")));
                }
                Some(ambulance)
            }
            None => state
                .ambulances
                .values_mut()
                .filter(|a| a.hospital_id == hospital_id && a.status == AmbulanceStatus::Available)
                .min_by(|a, b| a.vehicle_number.cmp(&b.vehicle_number)),
        };
        Ok(candidate.map(|ambulance| {
            ambulance.status = AmbulanceStatus::Assigned;
            ambulance.clone()
        }))
    }

    pub(crate) fn set_ambulance_status_now(&self, id: AmbulanceId, status: AmbulanceStatus) {
        if let Some(ambulance) = self.state.write().ambulances.get_mut(&id) {
            ambulance.status = status;
        }
    }

    pub(crate) fn put_request_now(&self, request: EmergencyRequest) {
        let mut state = self.state.write();
        if !state.requests.contains_key(&request.id) {
            state.request_order.push(request.id);
        }
        state.requests.insert(request.id, request);
    }

    pub(crate) fn forget_ambulance_now(&self, id: AmbulanceId) {
        self.state.write().ambulances.remove(&id);
    }

    pub(crate) fn grants_now(&self, request_id: RequestId) -> Vec<ResourceGrant> {
        self.state
            .read()
            .grants
            .iter()
            .filter(|g| g.request_id == request_id)
            .cloned()
            .collect()
    }

    pub(crate) fn insert_grants_now(&self, grants: Vec<ResourceGrant>) {
        self.state.write().grants.extend(grants);
    }

    pub(crate) fn take_allocated_grants_now(&self, request_id: RequestId, now_ms: u128) -> Vec<ResourceGrant> {
        let mut state = self.state.write();
        state
            .grants
            .iter_mut()
            .filter(|g| g.request_id == request_id && g.status == GrantStatus::Allocated)
            .map(|g| {
                g.status = GrantStatus::Released;
                g.released_at_ms = Some(now_ms);
                g.clone()
            })
            .collect()
    }
}

#[async_trait]
impl DispatchStore for InMemoryStore {
    async fn put_hospital(&self, hospital: Hospital) -> DispatchResult<()> {
        self.put_hospital_now(hospital);
        Ok(())
    }

    async fn hospital(&self, id: HospitalId) -> DispatchResult<Option<Hospital>> {
        Ok(self.state.read().hospitals.get(&id).cloned())
    }

    async fn hospitals(&self) -> DispatchResult<Vec<Hospital>> {
        Ok(self.state.read().hospitals.values().cloned().collect())
    }

    async fn remove_hospital(&self, id: HospitalId) -> DispatchResult<bool> {
        Ok(self.remove_hospital_now(id))
    }

    async fn put_preference(&self, preference: SchedulingPreference) -> DispatchResult<()> {
        self.put_preference_now(preference);
        Ok(())
    }

    async fn preference(&self, hospital_id: HospitalId) -> DispatchResult<Option<SchedulingPreference>> {
        Ok(self.state.read().preferences.get(&hospital_id).cloned())
    }

    async fn insert_ambulance(&self, hospital_id: HospitalId, vehicle_number: String) -> DispatchResult<Ambulance> {
        Ok(self.insert_ambulance_now(hospital_id, vehicle_number))
    }

    async fn ambulance(&self, id: AmbulanceId) -> DispatchResult<Option<Ambulance>> {
        Ok(self.state.read().ambulances.get(&id).cloned())
    }

    async fn ambulances(&self, hospital_id: HospitalId) -> DispatchResult<Vec<Ambulance>> {
        let mut fleet: Vec<_> = self
            .state
            .read()
            .ambulances
            .values()
            .filter(|a| a.hospital_id == hospital_id)
            .cloned()
            .collect();
        fleet.sort_by(|a, b| a.vehicle_number.cmp(&b.vehicle_number));
        Ok(fleet)
    }

    async fn claim_ambulance(
        &self,
        hospital_id: HospitalId,
        preferred: Option<AmbulanceId>,
    ) -> DispatchResult<Option<Ambulance>> {
        self.claim_ambulance_now(hospital_id, preferred)
    }

    async fn release_ambulance(&self, id: AmbulanceId) -> DispatchResult<()> {
        self.set_ambulance_status_now(id, AmbulanceStatus::Available);
        Ok(())
    }

    async fn put_request(&self, request: EmergencyRequest) -> DispatchResult<()> {
        self.put_request_now(request);
        Ok(())
    }

    async fn request(&self, id: RequestId) -> DispatchResult<Option<EmergencyRequest>> {
        Ok(self.state.read().requests.get(&id).cloned())
    }

    async fn requests(&self) -> DispatchResult<Vec<EmergencyRequest>> {
        let state = self.state.read();
        let mut all: Vec<_> = state
            .request_order
            .iter()
            .filter_map(|id| state.requests.get(id).cloned())
            .collect();
        all.sort_by_key(|r| r.created_at_ms);
        Ok(all)
    }

    async fn insert_grants(&self, grants: Vec<ResourceGrant>) -> DispatchResult<()> {
        self.insert_grants_now(grants);
        Ok(())
    }

    async fn grants(&self, request_id: RequestId) -> DispatchResult<Vec<ResourceGrant>> {
        Ok(self.grants_now(request_id))
    }

    async fn take_allocated_grants(&self, request_id: RequestId, now_ms: u128) -> DispatchResult<Vec<ResourceGrant>> {
        Ok(self.take_allocated_grants_now(request_id, now_ms))
    }

    async fn allocated_grants(&self, hospital_id: HospitalId) -> DispatchResult<Vec<ResourceGrant>> {
        Ok(self
            .state
            .read()
            .grants
            .iter()
            .filter(|g| g.hospital_id == hospital_id && g.status == GrantStatus::Allocated)
            .cloned()
            .collect())
    }
}
