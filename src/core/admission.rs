//! Admission control: decides whether a request may take units from a
//! hospital and records what it took.
//!
//! `check_safety` is a plain bounds check against the current snapshot, not
//! a full Banker's safe-state search. It only filters obvious rejections
//! cheaply; the authoritative decision is the serialized debit in the ledger.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::core::error::{DispatchError, DispatchResult};
use crate::core::ledger::ResourceLedger;
use crate::core::model::{GrantStatus, ResourceGrant};
use crate::infra::store::DispatchStore;
use crate::util::serde::{HospitalId, PriorityClass, RequestId, ResourceCounts, ResourceKind};

/// Units a request of the given class needs: one ambulance, one doctor, and
/// a room for critical or high.
#[must_use]
pub fn requested_resources(priority: PriorityClass) -> ResourceCounts {
    let mut requested = ResourceCounts::from([(ResourceKind::Ambulance, 1), (ResourceKind::Doctor, 1)]);
    if priority.needs_room() {
        requested.insert(ResourceKind::Room, 1);
    }
    requested
}

/// Outcome of the pre-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Safety {
    /// Every kind fits in the current availability.
    Safe,
    /// The first kind that does not fit, as seen in the snapshot.
    Unsafe {
        /// Short kind.
        kind: ResourceKind,
        /// Units requested of that kind.
        requested: u32,
        /// Units free in the snapshot.
        available: u32,
    },
}

impl fmt::Display for Safety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => f.write_str("safe"),
            Self::Unsafe {
                kind,
                requested,
                available,
            } => write!(f, "unsafe: insufficient {kind}s: requested {requested}, available {available}"),
        }
    }
}

/// Grants and releases ledger units on behalf of requests.
pub struct AdmissionController {
    ledger: Arc<ResourceLedger>,
    max_conflict_retries: u32,
}

impl AdmissionController {
    /// Controller over a shared ledger.
    #[must_use]
    pub const fn new(ledger: Arc<ResourceLedger>, max_conflict_retries: u32) -> Self {
        Self {
            ledger,
            max_conflict_retries,
        }
    }

    /// Ledger this controller debits.
    #[must_use]
    pub const fn ledger(&self) -> &Arc<ResourceLedger> {
        &self.ledger
    }

    /// Compare `requested` with a fresh availability snapshot.
    pub fn check_safety(&self, hospital_id: HospitalId, requested: &ResourceCounts) -> DispatchResult<Safety> {
        let available = self.ledger.available_snapshot(hospital_id)?;
        for (&kind, &count) in requested {
            let free = available.get(&kind).copied().unwrap_or(0);
            if count > free {
                return Ok(Safety::Unsafe {
                    kind,
                    requested: count,
                    available: free,
                });
            }
        }
        Ok(Safety::Safe)
    }

    /// Debit `requested` from the hospital and persist one grant per kind.
    ///
    /// Zero counts are dropped before anything else; an empty request is a
    /// validation error. Lost races are retried up to the configured bound.
    pub async fn allocate<S: DispatchStore + ?Sized>(
        &self,
        store: &S,
        request_id: RequestId,
        hospital_id: HospitalId,
        requested: &ResourceCounts,
        now_ms: u128,
    ) -> DispatchResult<Vec<ResourceGrant>> {
        let requested: ResourceCounts = requested
            .iter()
            .filter(|&(_, &count)| count > 0)
            .map(|(&kind, &count)| (kind, count))
            .collect();
        if requested.is_empty() {
            return Err(DispatchError::Validation("allocation requests no resources".into()));
        }

        let mut attempt = 0;
        loop {
            if let Safety::Unsafe {
                kind,
                requested: count,
                available,
            } = self.check_safety(hospital_id, &requested)?
            {
                warn!(%request_id, hospital_id, %kind, count, available, "allocation rejected");
                return Err(DispatchError::UnsafeAllocation {
                    kind,
                    requested: count,
                    available,
                });
            }
            debug!(%request_id, hospital_id, ?requested, attempt, "pre-check passed");

            match self.ledger.try_debit(hospital_id, &requested) {
                Ok(()) => break,
                Err(err @ (DispatchError::UnsafeAllocation { .. } | DispatchError::ConcurrentConflict(_))) => {
                    if attempt >= self.max_conflict_retries {
                        warn!(%request_id, hospital_id, attempt, %err, "allocation lost the race");
                        return Err(DispatchError::ConcurrentConflict(format!(
                            "hospital {hospital_id} availability changed during allocation"
                        )));
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }

        let grants: Vec<_> = requested
            .iter()
            .map(|(&kind, &count)| ResourceGrant {
                request_id,
                hospital_id,
                kind,
                count,
                status: GrantStatus::Allocated,
                allocated_at_ms: now_ms,
                released_at_ms: None,
            })
            .collect();

        if let Err(err) = store.insert_grants(grants.clone()).await {
            error!(%request_id, hospital_id, %err, "grant write failed; crediting back");
            if let Err(credit_err) = self.ledger.credit(hospital_id, &requested) {
                error!(%request_id, hospital_id, %credit_err, "credit-back after failed grant write failed");
            }
            return Err(match err {
                DispatchError::StoreUnavailable(_) => err,
                other => DispatchError::StoreUnavailable(other.to_string()),
            });
        }
        info!(%request_id, hospital_id, ?requested, "resources allocated");
        Ok(grants)
    }

    /// Return every unit the request still holds. Calling it again is a no-op.
    pub async fn release<S: DispatchStore + ?Sized>(
        &self,
        store: &S,
        request_id: RequestId,
        now_ms: u128,
    ) -> DispatchResult<Vec<ResourceGrant>> {
        let released = store.take_allocated_grants(request_id, now_ms).await?;
        if released.is_empty() {
            debug!(%request_id, "nothing to release");
            return Ok(released);
        }

        let mut per_hospital: BTreeMap<HospitalId, ResourceCounts> = BTreeMap::new();
        for grant in &released {
            *per_hospital
                .entry(grant.hospital_id)
                .or_default()
                .entry(grant.kind)
                .or_insert(0) += grant.count;
        }
        for (hospital_id, deltas) in &per_hospital {
            self.ledger.credit(*hospital_id, deltas)?;
            info!(%request_id, hospital_id, ?deltas, "resources released");
        }
        Ok(released)
    }

    /// Units held by allocated grants of the hospital, per kind.
    pub async fn outstanding<S: DispatchStore + ?Sized>(
        &self,
        store: &S,
        hospital_id: HospitalId,
    ) -> DispatchResult<ResourceCounts> {
        let mut held = ResourceCounts::new();
        for grant in store.allocated_grants(hospital_id).await? {
            *held.entry(grant.kind).or_insert(0) += grant.count;
        }
        Ok(held)
    }
}
