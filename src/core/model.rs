//! Persistent records shared by the store, ledger and dispatcher.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::lifecycle::EmergencyRequest;
use crate::core::ledger::PoolSnapshot;
use crate::core::queue_policy::QueuePolicy;
use crate::util::serde::{
    AmbulanceId, GeoPoint, HospitalId, PatientRef, PriorityClass, RequestId, ResourceCounts,
    ResourceKind,
};

/// Severity weights used by the weighted priority policy.
pub type PriorityWeights = BTreeMap<PriorityClass, u32>;

/// `{critical: 4, high: 3, medium: 2, low: 1}`.
#[must_use]
pub fn default_priority_weights() -> PriorityWeights {
    PriorityClass::ALL
        .iter()
        .map(|class| (*class, u32::from(5 - class.rank())))
        .collect()
}

const fn default_ambulances() -> u32 {
    5
}

const fn default_doctors() -> u32 {
    10
}

const fn default_rooms() -> u32 {
    20
}

/// Input for registering a hospital.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalRegistration {
    /// Hospital identifier, unique across the system.
    pub id: HospitalId,
    /// Display name.
    pub name: String,
    /// Street address.
    #[serde(default)]
    pub address: String,
    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
    /// Hospital coordinates.
    pub location: GeoPoint,
    /// Ambulance capacity.
    #[serde(default = "default_ambulances")]
    pub total_ambulances: u32,
    /// Doctor capacity.
    #[serde(default = "default_doctors")]
    pub total_doctors: u32,
    /// Room capacity.
    #[serde(default = "default_rooms")]
    pub total_rooms: u32,
    /// Initial scheduling policy name. Unknown names fall back to the default.
    #[serde(default)]
    pub scheduling_policy: Option<String>,
    /// Explicit severity weights; enables the weighted priority variant.
    #[serde(default)]
    pub priority_weights: Option<PriorityWeights>,
    /// Vehicle numbers of the hospital's ambulance fleet.
    #[serde(default)]
    pub ambulances: Vec<String>,
}

impl HospitalRegistration {
    /// Registration with the default capacities.
    pub fn new(id: HospitalId, name: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id,
            name: name.into(),
            address: String::new(),
            phone: None,
            location,
            total_ambulances: default_ambulances(),
            total_doctors: default_doctors(),
            total_rooms: default_rooms(),
            scheduling_policy: None,
            priority_weights: None,
            ambulances: Vec::new(),
        }
    }

    /// Override all three capacities.
    #[must_use]
    pub const fn with_capacity(mut self, ambulances: u32, doctors: u32, rooms: u32) -> Self {
        self.total_ambulances = ambulances;
        self.total_doctors = doctors;
        self.total_rooms = rooms;
        self
    }

    /// Set the initial scheduling policy name.
    #[must_use]
    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.scheduling_policy = Some(policy.into());
        self
    }

    /// Register an ambulance fleet by vehicle number.
    #[must_use]
    pub fn with_fleet<I, V>(mut self, vehicles: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.ambulances = vehicles.into_iter().map(Into::into).collect();
        self
    }

    /// Totals per kind.
    #[must_use]
    pub fn capacity(&self) -> ResourceCounts {
        ResourceCounts::from([
            (ResourceKind::Ambulance, self.total_ambulances),
            (ResourceKind::Doctor, self.total_doctors),
            (ResourceKind::Room, self.total_rooms),
        ])
    }

    /// Check required fields.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        self.location.validate()?;
        if self.ambulances.iter().any(|v| v.trim().is_empty()) {
            return Err("ambulance vehicle numbers must not be empty".into());
        }
        Ok(())
    }
}

/// Partial change to a hospital. Unset fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HospitalUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New street address.
    pub address: Option<String>,
    /// New contact phone.
    pub phone: Option<String>,
    /// New coordinates. Requests already created keep their distance.
    pub location: Option<GeoPoint>,
    /// New ambulance capacity.
    pub total_ambulances: Option<u32>,
    /// New doctor capacity.
    pub total_doctors: Option<u32>,
    /// New room capacity.
    pub total_rooms: Option<u32>,
}

impl HospitalUpdate {
    /// Capacities being changed, per kind.
    #[must_use]
    pub fn capacity(&self) -> ResourceCounts {
        [
            (ResourceKind::Ambulance, self.total_ambulances),
            (ResourceKind::Doctor, self.total_doctors),
            (ResourceKind::Room, self.total_rooms),
        ]
        .into_iter()
        .filter_map(|(kind, total)| total.map(|total| (kind, total)))
        .collect()
    }

    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.address.is_none()
            && self.phone.is_none()
            && self.location.is_none()
            && self.capacity().is_empty()
    }

    /// Reject empty updates, blank names and invalid coordinates.
    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("no fields to update".into());
        }
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err("name must not be empty".into());
        }
        if let Some(location) = &self.location {
            location.validate()?;
        }
        Ok(())
    }
}

/// Stored hospital record. Live availability lives in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    /// Hospital identifier.
    pub id: HospitalId,
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Contact phone.
    pub phone: Option<String>,
    /// Hospital coordinates.
    pub location: GeoPoint,
    /// Total units per kind.
    pub capacity: ResourceCounts,
    /// Registration time.
    pub created_at_ms: u128,
}

/// Ambulance availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbulanceStatus {
    /// Ready for assignment.
    Available,
    /// Bound to an active request.
    Assigned,
}

/// One vehicle of a hospital's fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ambulance {
    /// Ambulance identifier.
    pub id: AmbulanceId,
    /// Owning hospital.
    pub hospital_id: HospitalId,
    /// Plate or fleet number.
    pub vehicle_number: String,
    /// Current availability.
    pub status: AmbulanceStatus,
}

/// Per-hospital queue policy selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingPreference {
    /// Hospital the preference belongs to.
    pub hospital_id: HospitalId,
    /// Selected policy.
    pub policy: QueuePolicy,
    /// Severity weights.
    pub weights: PriorityWeights,
    /// Whether the priority policy orders by `weights` instead of class rank.
    #[serde(default)]
    pub weighted: bool,
}

impl SchedulingPreference {
    /// Unweighted preference with the default weights.
    #[must_use]
    pub fn new(hospital_id: HospitalId, policy: QueuePolicy) -> Self {
        Self {
            hospital_id,
            policy,
            weights: default_priority_weights(),
            weighted: false,
        }
    }
}

/// Grant state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantStatus {
    /// Units are held by the request.
    Allocated,
    /// Units were returned to the ledger.
    Released,
}

/// Audit row for units of one kind held by one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGrant {
    /// Request holding the units.
    pub request_id: RequestId,
    /// Hospital whose ledger was debited.
    pub hospital_id: HospitalId,
    /// Resource kind.
    pub kind: ResourceKind,
    /// Units held.
    pub count: u32,
    /// Current state.
    pub status: GrantStatus,
    /// Allocation time.
    pub allocated_at_ms: u128,
    /// Release time, once released.
    pub released_at_ms: Option<u128>,
}

/// Input for creating an emergency request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmergencyRequest {
    /// Patient reference.
    pub patient: PatientRef,
    /// Free-text symptoms.
    pub symptoms: String,
    /// Patient coordinates.
    pub location: GeoPoint,
    /// Target hospital.
    pub hospital_id: HospitalId,
}

/// Operational view of one hospital.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalStatus {
    /// Hospital identifier.
    pub hospital_id: HospitalId,
    /// Display name.
    pub name: String,
    /// Effective queue policy.
    pub policy: QueuePolicy,
    /// Totals and availability per kind.
    pub resources: BTreeMap<ResourceKind, PoolSnapshot>,
    /// Ambulance units currently held.
    pub active_ambulances: u32,
    /// Requests waiting in the queue.
    pub pending_requests: usize,
    /// Requests assigned or in progress.
    pub active_requests: usize,
    /// Mean minutes from creation to completion over completed requests.
    pub avg_response_minutes: Option<f64>,
}

/// System-wide counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemOverview {
    /// Registered hospitals.
    pub total_hospitals: usize,
    /// Ambulance capacity across hospitals.
    pub total_ambulances: u64,
    /// Free ambulance units across hospitals.
    pub available_ambulances: u64,
    /// Pending requests.
    pub pending_requests: usize,
    /// Assigned or in-progress requests.
    pub active_requests: usize,
    /// Completed requests.
    pub completed_requests: usize,
    /// Cancelled or rejected requests.
    pub closed_requests: usize,
    /// Most recent requests, newest first.
    pub recent_requests: Vec<EmergencyRequest>,
}
