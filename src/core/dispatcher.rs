//! Dispatcher: the request-facing service tying classifier, queue policy,
//! ledger and store together.
//!
//! Every mutating lifecycle call first claims the request id in an in-flight
//! set. The claim is not a lock: a second caller fails fast with
//! [`DispatchError::ConcurrentConflict`] instead of waiting, so no request is
//! allocated twice and nothing blocks across a store round-trip.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::DispatchConfig;
use crate::core::admission::{requested_resources, AdmissionController};
use crate::core::audit::{build_audit_event, AuditSink};
use crate::core::classifier::{distance_between, estimated_arrival_minutes, Classifier};
use crate::core::error::{DispatchError, DispatchResult};
use crate::core::ledger::{PoolSnapshot, ResourceLedger};
use crate::core::lifecycle::{EmergencyRequest, RequestStatus};
use crate::core::model::{
    Ambulance, Hospital, HospitalRegistration, HospitalStatus, HospitalUpdate, NewEmergencyRequest,
    PriorityWeights, ResourceGrant, SchedulingPreference, SystemOverview,
};
use crate::core::queue_policy::{QueueEntry, QueuePolicy};
use crate::infra::store::DispatchStore;
use crate::util::clock::Clock;
use crate::util::serde::{AmbulanceId, HospitalId, RequestId, ResourceCounts, ResourceKind};

/// Requests shown in [`SystemOverview::recent_requests`].
const RECENT_REQUESTS: usize = 10;

/// Releases an in-flight claim on drop.
struct InFlight<'a> {
    claims: &'a Mutex<HashSet<RequestId>>,
    request_id: RequestId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.claims.lock().remove(&self.request_id);
    }
}

/// Emergency dispatch service over a [`DispatchStore`].
pub struct Dispatcher<S: DispatchStore> {
    store: Arc<S>,
    admission: AdmissionController,
    classifier: Classifier,
    minutes_per_km: f64,
    default_policy: QueuePolicy,
    default_weights: PriorityWeights,
    clock: Arc<dyn Clock>,
    audit: Option<Arc<Mutex<Box<dyn AuditSink>>>>,
    in_flight: Mutex<HashSet<RequestId>>,
}

impl<S: DispatchStore> Dispatcher<S> {
    /// Build a dispatcher with an empty ledger. Hospitals already in the
    /// store are not tracked until restored (see the dispatch builder).
    pub fn new(store: Arc<S>, config: &DispatchConfig, clock: Arc<dyn Clock>) -> DispatchResult<Self> {
        let default_policy = config.scheduling.default_policy.parse()?;
        let ledger = Arc::new(ResourceLedger::new(Duration::from_millis(
            config.admission.lock_timeout_ms,
        )));
        Ok(Self {
            store,
            admission: AdmissionController::new(ledger, config.admission.max_conflict_retries),
            classifier: Classifier::new(&config.classifier),
            minutes_per_km: config.minutes_per_km,
            default_policy,
            default_weights: config.scheduling.default_weights.clone(),
            clock,
            audit: None,
            in_flight: Mutex::new(HashSet::new()),
        })
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, sink: Box<dyn AuditSink>) -> Self {
        self.audit = Some(Arc::new(Mutex::new(sink)));
        self
    }

    /// Backing store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Shared ledger.
    #[must_use]
    pub const fn ledger(&self) -> &Arc<ResourceLedger> {
        self.admission.ledger()
    }

    /// Injected clock.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn record(&self, request_id: Option<RequestId>, hospital_id: HospitalId, action: &str, detail: Option<String>) {
        if let Some(sink) = &self.audit {
            let mut event = build_audit_event(request_id, hospital_id, action, detail);
            event.created_at_ms = self.clock.now_ms();
            sink.lock().record(event);
        }
    }

    fn claim(&self, request_id: RequestId) -> DispatchResult<InFlight<'_>> {
        if !self.in_flight.lock().insert(request_id) {
            debug!(%request_id, "request already being mutated");
            return Err(DispatchError::ConcurrentConflict(format!(
                "request {request_id} is being updated by another caller"
            )));
        }
        Ok(InFlight {
            claims: &self.in_flight,
            request_id,
        })
    }

    async fn load_hospital(&self, hospital_id: HospitalId) -> DispatchResult<Hospital> {
        self.store
            .hospital(hospital_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("hospital", hospital_id))
    }

    async fn load_request(&self, request_id: RequestId) -> DispatchResult<EmergencyRequest> {
        self.store
            .request(request_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("request", request_id))
    }

    async fn save_request(&self, request: &EmergencyRequest) -> DispatchResult<()> {
        self.store.put_request(request.clone()).await.inspect_err(|err| {
            error!(request_id = %request.id, status = %request.status, %err, "failed to persist request");
        })
    }

    fn default_preference(&self, hospital_id: HospitalId) -> SchedulingPreference {
        SchedulingPreference {
            hospital_id,
            policy: self.default_policy,
            weights: self.default_weights.clone(),
            weighted: false,
        }
    }

    /// Persist a hospital, track its capacity and store its preference and fleet.
    pub async fn register_hospital(&self, registration: HospitalRegistration) -> DispatchResult<Hospital> {
        registration.validate().map_err(DispatchError::Validation)?;
        let hospital_id = registration.id;
        if self.ledger().contains(hospital_id) || self.store.hospital(hospital_id).await?.is_some() {
            return Err(DispatchError::Validation(format!("hospital {hospital_id} already registered")));
        }

        let hospital = Hospital {
            id: hospital_id,
            name: registration.name.trim().to_string(),
            address: registration.address.clone(),
            phone: registration.phone.clone(),
            location: registration.location,
            capacity: registration.capacity(),
            created_at_ms: self.clock.now_ms(),
        };
        self.store.put_hospital(hospital.clone()).await?;
        self.ledger().register(hospital_id, &hospital.capacity)?;

        let policy = match registration.scheduling_policy.as_deref().map(str::parse::<QueuePolicy>) {
            Some(Ok(policy)) => policy,
            Some(Err(err)) => {
                warn!(hospital_id, %err, default = self.default_policy.as_str(), "falling back to default policy");
                self.default_policy
            }
            None => self.default_policy,
        };
        let preference = SchedulingPreference {
            hospital_id,
            policy,
            weighted: registration.priority_weights.is_some(),
            weights: registration
                .priority_weights
                .clone()
                .unwrap_or_else(|| self.default_weights.clone()),
        };
        self.store.put_preference(preference).await?;

        for vehicle in &registration.ambulances {
            self.store
                .insert_ambulance(hospital_id, vehicle.trim().to_string())
                .await?;
        }

        info!(hospital_id, name = %hospital.name, policy = policy.as_str(), fleet = registration.ambulances.len(), "hospital registered");
        self.record(None, hospital_id, "register", Some(hospital.name.clone()));
        Ok(hospital)
    }

    /// Select a hospital's queue policy. `weights` enables the weighted
    /// priority variant.
    pub async fn set_policy(
        &self,
        hospital_id: HospitalId,
        name: &str,
        weights: Option<PriorityWeights>,
    ) -> DispatchResult<SchedulingPreference> {
        self.load_hospital(hospital_id).await?;
        let policy: QueuePolicy = name.parse()?;
        if weights.as_ref().is_some_and(PriorityWeights::is_empty) {
            return Err(DispatchError::Validation("priority weights must not be empty".into()));
        }
        let preference = SchedulingPreference {
            hospital_id,
            policy,
            weighted: weights.is_some(),
            weights: weights.unwrap_or_else(|| self.default_weights.clone()),
        };
        self.store.put_preference(preference.clone()).await?;
        info!(hospital_id, policy = policy.as_str(), weighted = preference.weighted, "scheduling policy updated");
        self.record(None, hospital_id, "policy", Some(policy.as_str().to_string()));
        Ok(preference)
    }

    /// Stored preference, or the configured default.
    pub async fn preference(&self, hospital_id: HospitalId) -> DispatchResult<SchedulingPreference> {
        Ok(self
            .store
            .preference(hospital_id)
            .await?
            .unwrap_or_else(|| self.default_preference(hospital_id)))
    }

    /// Add a vehicle to a hospital's fleet.
    pub async fn register_ambulance(&self, hospital_id: HospitalId, vehicle_number: &str) -> DispatchResult<Ambulance> {
        let vehicle_number = vehicle_number.trim();
        if vehicle_number.is_empty() {
            return Err(DispatchError::Validation("vehicle number must not be empty".into()));
        }
        self.load_hospital(hospital_id).await?;
        let ambulance = self
            .store
            .insert_ambulance(hospital_id, vehicle_number.to_string())
            .await?;
        info!(hospital_id, ambulance_id = ambulance.id, vehicle_number, "ambulance registered");
        Ok(ambulance)
    }

    /// A hospital's fleet.
    pub async fn ambulances(&self, hospital_id: HospitalId) -> DispatchResult<Vec<Ambulance>> {
        self.load_hospital(hospital_id).await?;
        self.store.ambulances(hospital_id).await
    }

    /// Change one kind's capacity, keeping held units held.
    pub async fn resize_capacity(
        &self,
        hospital_id: HospitalId,
        kind: ResourceKind,
        new_total: u32,
    ) -> DispatchResult<PoolSnapshot> {
        let mut hospital = self.load_hospital(hospital_id).await?;
        let previous = hospital.capacity.clone();
        let pool = self.ledger().resize(hospital_id, kind, new_total)?;
        hospital.capacity.insert(kind, new_total);
        if let Err(err) = self.store.put_hospital(hospital).await {
            self.revert_capacity(hospital_id, &previous, &ResourceCounts::from([(kind, new_total)]));
            return Err(err);
        }
        self.record(None, hospital_id, "resize", Some(format!("{kind}={new_total}")));
        Ok(pool)
    }

    fn revert_capacity(&self, hospital_id: HospitalId, previous: &ResourceCounts, changed: &ResourceCounts) {
        let totals: ResourceCounts = changed
            .keys()
            .map(|kind| (*kind, previous.get(kind).copied().unwrap_or(0)))
            .collect();
        if let Err(err) = self.ledger().resize_all(hospital_id, &totals) {
            error!(hospital_id, ?totals, %err, "failed to restore ledger capacity");
        }
    }

    /// Change a hospital's profile, location or capacities.
    ///
    /// Capacity changes keep held units held and are applied as a whole:
    /// if any kind would drop below its use, nothing changes.
    pub async fn update_hospital(&self, hospital_id: HospitalId, update: HospitalUpdate) -> DispatchResult<Hospital> {
        update.validate().map_err(DispatchError::Validation)?;
        let mut hospital = self.load_hospital(hospital_id).await?;
        let previous = hospital.capacity.clone();
        let capacity = update.capacity();
        let HospitalUpdate {
            name,
            address,
            phone,
            location,
            ..
        } = update;

        if let Some(name) = name {
            hospital.name = name.trim().to_string();
        }
        if let Some(address) = address {
            hospital.address = address;
        }
        if phone.is_some() {
            hospital.phone = phone;
        }
        if let Some(location) = location {
            hospital.location = location;
        }
        if !capacity.is_empty() {
            self.ledger().resize_all(hospital_id, &capacity)?;
            hospital.capacity.extend(capacity.iter().map(|(kind, total)| (*kind, *total)));
        }

        if let Err(err) = self.store.put_hospital(hospital.clone()).await {
            if !capacity.is_empty() {
                self.revert_capacity(hospital_id, &previous, &capacity);
            }
            return Err(err);
        }
        info!(hospital_id, name = %hospital.name, ?capacity, "hospital updated");
        self.record(None, hospital_id, "update", Some(hospital.name.clone()));
        Ok(hospital)
    }

    /// Remove a hospital with its preference and fleet.
    ///
    /// Refused while the hospital has pending or active requests or holds
    /// allocated grants. Closed requests and released grants stay as history.
    pub async fn remove_hospital(&self, hospital_id: HospitalId) -> DispatchResult<Hospital> {
        let hospital = self.load_hospital(hospital_id).await?;
        let open = self
            .store
            .requests_for_hospital(hospital_id)
            .await?
            .iter()
            .filter(|r| !r.status.is_terminal())
            .count();
        if open > 0 {
            return Err(DispatchError::Validation(format!(
                "hospital {hospital_id} still has {open} open requests"
            )));
        }
        let held = self.outstanding_grants(hospital_id).await?;
        if !held.is_empty() {
            return Err(DispatchError::Validation(format!(
                "hospital {hospital_id} still holds allocated grants: {held:?}"
            )));
        }

        let pools = self.ledger().remove(hospital_id)?;
        if let Err(err) = self.store.remove_hospital(hospital_id).await {
            let totals: ResourceCounts = pools.iter().map(|(kind, pool)| (*kind, pool.total)).collect();
            if let Err(register_err) = self.ledger().register(hospital_id, &totals) {
                error!(hospital_id, %register_err, "failed to re-track hospital after store failure");
            }
            return Err(err);
        }
        warn!(hospital_id, name = %hospital.name, "hospital removed");
        self.record(None, hospital_id, "remove", Some(hospital.name.clone()));
        Ok(hospital)
    }

    /// Validate, classify and persist a new pending request.
    pub async fn create_request(&self, input: NewEmergencyRequest) -> DispatchResult<EmergencyRequest> {
        let patient = input.patient.trim();
        if patient.is_empty() {
            return Err(DispatchError::Validation("patient must not be empty".into()));
        }
        let symptoms = input.symptoms.trim();
        if symptoms.is_empty() {
            return Err(DispatchError::Validation("symptoms must not be empty".into()));
        }
        input.location.validate().map_err(DispatchError::Validation)?;
        let hospital = self.load_hospital(input.hospital_id).await?;

        let distance_km = distance_between(input.location, hospital.location);
        let request = EmergencyRequest {
            id: RequestId::new_v4(),
            patient: patient.to_string(),
            hospital_id: hospital.id,
            symptoms: symptoms.to_string(),
            priority: self.classifier.classify(symptoms),
            location: input.location,
            distance_km,
            estimated_arrival_minutes: estimated_arrival_minutes(distance_km, self.minutes_per_km),
            status: RequestStatus::Pending,
            ambulance_id: None,
            created_at_ms: self.clock.now_ms(),
            assigned_at_ms: None,
            completed_at_ms: None,
            closed_at_ms: None,
            close_reason: None,
        };
        self.save_request(&request).await?;

        info!(
            request_id = %request.id,
            hospital_id = hospital.id,
            priority = %request.priority,
            distance_km = request.distance_km,
            eta_minutes = request.estimated_arrival_minutes,
            "emergency request created"
        );
        self.record(Some(request.id), hospital.id, "create", Some(request.priority.to_string()));
        Ok(request)
    }

    /// Pending requests of the hospital in the order its policy serves them.
    pub async fn queue(&self, hospital_id: HospitalId) -> DispatchResult<Vec<QueueEntry>> {
        self.load_hospital(hospital_id).await?;
        let preference = self.preference(hospital_id).await?;
        let pending = self.store.pending_requests(hospital_id).await?;
        let weights = preference.weighted.then_some(&preference.weights);
        Ok(preference
            .policy
            .ranked(&pending, hospital_id, self.clock.now_ms(), weights))
    }

    /// Allocate resources for a pending request and bind an ambulance.
    ///
    /// With `ambulance`, that vehicle must be free and belong to the request's
    /// hospital. Without it the first free vehicle is bound, if the hospital
    /// keeps a fleet at all.
    pub async fn assign(&self, request_id: RequestId, ambulance: Option<AmbulanceId>) -> DispatchResult<EmergencyRequest> {
        let _claim = self.claim(request_id)?;
        let mut request = self.load_request(request_id).await?;
        request.status.check_transition(RequestStatus::Assigned)?;
        let hospital_id = request.hospital_id;
        let now = self.clock.now_ms();

        let requested = requested_resources(request.priority);
        let grants = self
            .admission
            .allocate(self.store.as_ref(), request_id, hospital_id, &requested, now)
            .await?;
        self.record(Some(request_id), hospital_id, "allocate", Some(describe_grants(&grants)));

        let bound = match self.store.claim_ambulance(hospital_id, ambulance).await {
            Ok(bound) => bound,
            Err(err) => {
                self.undo_allocation(request_id, now).await;
                return Err(err);
            }
        };
        let ambulance_id = bound.map(|a| a.id);

        request.mark_assigned(ambulance_id, now)?;
        if let Err(err) = self.save_request(&request).await {
            if let Some(id) = ambulance_id {
                if let Err(release_err) = self.store.release_ambulance(id).await {
                    error!(%request_id, ambulance_id = id, %release_err, "failed to free ambulance on rollback");
                }
            }
            self.undo_allocation(request_id, now).await;
            return Err(err);
        }

        info!(%request_id, hospital_id, ?ambulance_id, priority = %request.priority, "request assigned");
        self.record(Some(request_id), hospital_id, "assign", ambulance_id.map(|id| format!("ambulance {id}")));
        Ok(request)
    }

    async fn undo_allocation(&self, request_id: RequestId, now: u128) {
        if let Err(err) = self.admission.release(self.store.as_ref(), request_id, now).await {
            error!(%request_id, %err, "failed to roll back allocation");
        }
    }

    /// Assign the head of the hospital's queue. `None` when nothing is pending.
    ///
    /// Entries another caller already holds or has moved on are skipped.
    /// Running out of resources stops at the head.
    pub async fn dispatch_next(&self, hospital_id: HospitalId) -> DispatchResult<Option<EmergencyRequest>> {
        for entry in self.queue(hospital_id).await? {
            match self.assign(entry.request_id, None).await {
                Ok(request) => return Ok(Some(request)),
                Err(err @ (DispatchError::ConcurrentConflict(_) | DispatchError::InvalidTransition { .. })) => {
                    debug!(request_id = %entry.request_id, %err, "queue entry taken by another caller");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    /// `assigned → in_progress`.
    pub async fn start(&self, request_id: RequestId) -> DispatchResult<EmergencyRequest> {
        let _claim = self.claim(request_id)?;
        let mut request = self.load_request(request_id).await?;
        request.mark_in_progress()?;
        self.save_request(&request).await?;
        info!(%request_id, hospital_id = request.hospital_id, "request in progress");
        self.record(Some(request_id), request.hospital_id, "start", None);
        Ok(request)
    }

    /// Release everything the request holds and mark it completed.
    pub async fn complete(&self, request_id: RequestId) -> DispatchResult<EmergencyRequest> {
        let _claim = self.claim(request_id)?;
        let mut request = self.load_request(request_id).await?;
        request.status.check_transition(RequestStatus::Completed)?;
        let now = self.clock.now_ms();

        self.release_held(&request, now).await?;
        request.mark_completed(now)?;
        self.save_request(&request).await?;

        info!(%request_id, hospital_id = request.hospital_id, response_minutes = ?request.response_minutes(), "request completed");
        self.record(Some(request_id), request.hospital_id, "complete", None);
        Ok(request)
    }

    /// Cancel a pending or active request. Active requests release exactly
    /// as completion does; pending ones never touch the ledger.
    pub async fn cancel(&self, request_id: RequestId, reason: Option<String>) -> DispatchResult<EmergencyRequest> {
        let _claim = self.claim(request_id)?;
        let mut request = self.load_request(request_id).await?;
        request.status.check_transition(RequestStatus::Cancelled)?;
        let now = self.clock.now_ms();

        if request.status.is_active() {
            self.release_held(&request, now).await?;
        }
        request.mark_cancelled(reason.clone(), now)?;
        self.save_request(&request).await?;

        info!(%request_id, hospital_id = request.hospital_id, ?reason, "request cancelled");
        self.record(Some(request_id), request.hospital_id, "cancel", reason);
        Ok(request)
    }

    /// Decline a pending request.
    pub async fn reject(&self, request_id: RequestId, reason: &str) -> DispatchResult<EmergencyRequest> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DispatchError::Validation("rejection reason must not be empty".into()));
        }
        let _claim = self.claim(request_id)?;
        let mut request = self.load_request(request_id).await?;
        request.mark_rejected(reason.to_string(), self.clock.now_ms())?;
        self.save_request(&request).await?;

        warn!(%request_id, hospital_id = request.hospital_id, reason, "request rejected");
        self.record(Some(request_id), request.hospital_id, "reject", Some(reason.to_string()));
        Ok(request)
    }

    async fn release_held(&self, request: &EmergencyRequest, now: u128) -> DispatchResult<Vec<ResourceGrant>> {
        if let Some(id) = request.ambulance_id {
            self.store.release_ambulance(id).await?;
        }
        let released = self
            .admission
            .release(self.store.as_ref(), request.id, now)
            .await?;
        if !released.is_empty() {
            self.record(Some(request.id), request.hospital_id, "release", Some(describe_grants(&released)));
        }
        Ok(released)
    }

    /// Cancel pending requests older than `max_age`. Returns how many were
    /// cancelled; requests another caller is touching are left alone.
    pub async fn cancel_stale_pending(&self, max_age: Duration) -> DispatchResult<usize> {
        let now = self.clock.now_ms();
        let cutoff = max_age.as_millis();
        let stale: Vec<_> = self
            .store
            .requests()
            .await?
            .into_iter()
            .filter(|r| r.status == RequestStatus::Pending && now.saturating_sub(r.created_at_ms) >= cutoff)
            .map(|r| r.id)
            .collect();

        let mut cancelled = 0;
        for request_id in stale {
            match self.cancel(request_id, Some("stale pending request".into())).await {
                Ok(_) => cancelled += 1,
                Err(err @ (DispatchError::ConcurrentConflict(_) | DispatchError::InvalidTransition { .. })) => {
                    debug!(%request_id, %err, "skipping stale request");
                }
                Err(err) => return Err(err),
            }
        }
        if cancelled > 0 {
            info!(cancelled, max_age_secs = max_age.as_secs(), "stale pending requests cancelled");
        }
        Ok(cancelled)
    }

    /// Operational view of one hospital.
    #[allow(clippy::cast_precision_loss)]
    pub async fn hospital_status(&self, hospital_id: HospitalId) -> DispatchResult<HospitalStatus> {
        let hospital = self.load_hospital(hospital_id).await?;
        let preference = self.preference(hospital_id).await?;
        let resources = self.ledger().snapshot(hospital_id)?;
        let requests = self.store.requests_for_hospital(hospital_id).await?;

        let response_times: Vec<u64> = requests
            .iter()
            .filter(|r| r.status == RequestStatus::Completed)
            .filter_map(EmergencyRequest::response_minutes)
            .collect();
        let avg_response_minutes = (!response_times.is_empty())
            .then(|| response_times.iter().sum::<u64>() as f64 / response_times.len() as f64);

        Ok(HospitalStatus {
            hospital_id,
            name: hospital.name,
            policy: preference.policy,
            active_ambulances: resources
                .get(&ResourceKind::Ambulance)
                .map_or(0, PoolSnapshot::in_use),
            resources,
            pending_requests: requests
                .iter()
                .filter(|r| r.status == RequestStatus::Pending)
                .count(),
            active_requests: requests.iter().filter(|r| r.status.is_active()).count(),
            avg_response_minutes,
        })
    }

    /// System-wide counters.
    pub async fn overview(&self) -> DispatchResult<SystemOverview> {
        let hospitals = self.store.hospitals().await?;
        let mut total_ambulances = 0_u64;
        let mut available_ambulances = 0_u64;
        for hospital in &hospitals {
            if let Some(pool) = self.ledger().snapshot(hospital.id)?.get(&ResourceKind::Ambulance) {
                total_ambulances += u64::from(pool.total);
                available_ambulances += u64::from(pool.available);
            }
        }

        let requests = self.store.requests().await?;
        let count = |pred: fn(RequestStatus) -> bool| requests.iter().filter(|r| pred(r.status)).count();
        Ok(SystemOverview {
            total_hospitals: hospitals.len(),
            total_ambulances,
            available_ambulances,
            pending_requests: count(|s| s == RequestStatus::Pending),
            active_requests: count(RequestStatus::is_active),
            completed_requests: count(|s| s == RequestStatus::Completed),
            closed_requests: count(|s| matches!(s, RequestStatus::Cancelled | RequestStatus::Rejected)),
            recent_requests: requests.iter().rev().take(RECENT_REQUESTS).cloned().collect(),
        })
    }

    /// A patient's requests, newest first.
    pub async fn patient_requests(&self, patient: &str) -> DispatchResult<Vec<EmergencyRequest>> {
        self.store.requests_for_patient(patient.trim()).await
    }

    /// Fetch one request.
    pub async fn request(&self, request_id: RequestId) -> DispatchResult<EmergencyRequest> {
        self.load_request(request_id).await
    }

    /// Units held by allocated grants of the hospital.
    pub async fn outstanding_grants(&self, hospital_id: HospitalId) -> DispatchResult<ResourceCounts> {
        self.admission.outstanding(self.store.as_ref(), hospital_id).await
    }

    /// Ledger totals and availability of the hospital.
    pub fn ledger_snapshot(&self, hospital_id: HospitalId) -> DispatchResult<BTreeMap<ResourceKind, PoolSnapshot>> {
        self.ledger().snapshot(hospital_id)
    }
}

fn describe_grants(grants: &[ResourceGrant]) -> String {
    grants
        .iter()
        .map(|g| format!("{}x{}", g.kind, g.count))
        .collect::<Vec<_>>()
        .join(",")
}
