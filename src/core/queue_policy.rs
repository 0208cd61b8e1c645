//! Queue policies deciding which pending request a hospital serves next.
//!
//! A policy is a pure function of the pending set and "now". Nothing is
//! cached between reads: HRRN ratios grow with waiting time, so the order is
//! recomputed on every call and a request's position can only improve while
//! it waits.
//!
//! | Policy   | Key                                   | Tie-break        |
//! |----------|---------------------------------------|------------------|
//! | Priority | class rank ascending (or weight desc) | created ascending|
//! | FCFS     | created ascending                     | input order      |
//! | SJF      | distance ascending                    | created ascending|
//! | HRRN     | response ratio descending             | created ascending|

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::DispatchError;
use crate::core::lifecycle::{EmergencyRequest, RequestStatus};
use crate::core::model::PriorityWeights;
use crate::util::clock::whole_minutes_between;
use crate::util::serde::{HospitalId, PriorityClass, RequestId};

/// Supported scheduling disciplines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueuePolicy {
    /// Most severe first.
    Priority,
    /// First come, first served.
    Fcfs,
    /// Shortest job (distance) first.
    Sjf,
    /// Highest response ratio next.
    Hrrn,
}

impl QueuePolicy {
    /// Every policy.
    pub const ALL: [Self; 4] = [Self::Priority, Self::Fcfs, Self::Sjf, Self::Hrrn];

    /// Lowercase name as stored in preferences.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::Fcfs => "fcfs",
            Self::Sjf => "sjf",
            Self::Hrrn => "hrrn",
        }
    }

    /// Request ids of the hospital's pending requests, most urgent first.
    #[must_use]
    pub fn order(
        self,
        requests: &[EmergencyRequest],
        hospital_id: HospitalId,
        now_ms: u128,
    ) -> Vec<RequestId> {
        self.ranked(requests, hospital_id, now_ms, None)
            .into_iter()
            .map(|entry| entry.request_id)
            .collect()
    }

    /// Like [`QueuePolicy::order`] but returns the ranking detail. `weights`
    /// switches the priority policy to its weighted variant; other policies
    /// ignore it.
    #[must_use]
    pub fn ranked(
        self,
        requests: &[EmergencyRequest],
        hospital_id: HospitalId,
        now_ms: u128,
        weights: Option<&PriorityWeights>,
    ) -> Vec<QueueEntry> {
        let mut entries: Vec<QueueEntry> = requests
            .iter()
            .filter(|r| r.hospital_id == hospital_id && r.status == RequestStatus::Pending)
            .map(|r| QueueEntry::evaluate(r, now_ms, self == Self::Hrrn))
            .collect();

        // Stable sort, so equal keys keep input order.
        entries.sort_by(|a, b| self.compare(a, b, weights));
        entries
    }

    fn compare(self, a: &QueueEntry, b: &QueueEntry, weights: Option<&PriorityWeights>) -> Ordering {
        let by_created = a.created_at_ms.cmp(&b.created_at_ms);
        match self {
            Self::Priority => {
                let by_weight = weights.map_or(Ordering::Equal, |w| {
                    let weight = |class: PriorityClass| w.get(&class).copied().unwrap_or(0);
                    weight(b.priority).cmp(&weight(a.priority))
                });
                by_weight
                    .then_with(|| a.priority.rank().cmp(&b.priority.rank()))
                    .then(by_created)
            }
            Self::Fcfs => by_created,
            Self::Sjf => a.distance_km.total_cmp(&b.distance_km).then(by_created),
            Self::Hrrn => {
                let ra = a.response_ratio.unwrap_or(1.0);
                let rb = b.response_ratio.unwrap_or(1.0);
                rb.total_cmp(&ra).then(by_created)
            }
        }
    }
}

impl fmt::Display for QueuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueuePolicy {
    type Err = DispatchError;

    /// Case-insensitive. Anything else is [`DispatchError::UnknownPolicy`];
    /// there is no fallback here.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "priority" => Ok(Self::Priority),
            "fcfs" => Ok(Self::Fcfs),
            "sjf" => Ok(Self::Sjf),
            "hrrn" => Ok(Self::Hrrn),
            _ => Err(DispatchError::UnknownPolicy(s.to_string())),
        }
    }
}

/// `(waiting + max(eta, 1)) / max(eta, 1)`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn response_ratio(waiting_minutes: u64, estimated_arrival_minutes: u32) -> f64 {
    let service = f64::from(estimated_arrival_minutes.max(1));
    (waiting_minutes as f64 + service) / service
}

/// One ranked queue position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Request identifier.
    pub request_id: RequestId,
    /// Severity class.
    pub priority: PriorityClass,
    /// Creation time.
    pub created_at_ms: u128,
    /// Kilometers to the hospital.
    pub distance_km: f64,
    /// Estimated arrival in minutes.
    pub estimated_arrival_minutes: u32,
    /// Whole minutes waited at evaluation time.
    pub waiting_minutes: u64,
    /// HRRN ratio; only computed under the HRRN policy.
    pub response_ratio: Option<f64>,
}

impl QueueEntry {
    fn evaluate(request: &EmergencyRequest, now_ms: u128, with_ratio: bool) -> Self {
        let waiting_minutes = whole_minutes_between(request.created_at_ms, now_ms);
        Self {
            request_id: request.id,
            priority: request.priority,
            created_at_ms: request.created_at_ms,
            distance_km: request.distance_km,
            estimated_arrival_minutes: request.estimated_arrival_minutes,
            waiting_minutes,
            response_ratio: with_ratio
                .then(|| response_ratio(waiting_minutes, request.estimated_arrival_minutes)),
        }
    }
}
