//! Per-hospital resource ledger.
//!
//! The ledger is the only owner of `available` counts. Each hospital's pools
//! sit behind their own `parking_lot::Mutex`, so hospitals never contend with
//! each other while every debit/credit against one hospital is linearized.
//! The outer `RwLock` only guards the hospital map and is held just long
//! enough to clone the hospital's `Arc`.
//!
//! Reads, debits and resizes wait at most `lock_timeout` for a hospital's
//! lock; failing to acquire in time surfaces as
//! [`DispatchError::ConcurrentConflict`] rather than blocking. Credits wait
//! for the lock unconditionally: they run after grants are already flipped
//! to released, so a credit that gave up would lose the units for good.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard, RwLock};
use serde::{Deserialize, Serialize};

use crate::core::error::{DispatchError, DispatchResult};
use crate::util::serde::{HospitalId, ResourceCounts, ResourceKind};

/// Totals and free units of one resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Capacity.
    pub total: u32,
    /// Free units, never above `total`.
    pub available: u32,
}

impl PoolSnapshot {
    /// Units currently held by grants.
    #[must_use]
    pub const fn in_use(&self) -> u32 {
        self.total - self.available
    }
}

#[derive(Debug)]
struct HospitalPools {
    pools: BTreeMap<ResourceKind, PoolSnapshot>,
    /// Set when the hospital is removed; callers still holding the `Arc`
    /// must not debit it.
    retired: bool,
}

impl HospitalPools {
    fn pool_mut(&mut self, kind: ResourceKind) -> DispatchResult<&mut PoolSnapshot> {
        self.pools
            .get_mut(&kind)
            .ok_or_else(|| DispatchError::Validation(format!("resource kind {kind} is not tracked")))
    }
}

/// Authoritative free/total counter per hospital and resource kind.
pub struct ResourceLedger {
    hospitals: RwLock<HashMap<HospitalId, Arc<Mutex<HospitalPools>>>>,
    lock_timeout: Duration,
}

impl Default for ResourceLedger {
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}

impl ResourceLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            hospitals: RwLock::new(HashMap::new()),
            lock_timeout,
        }
    }

    /// Track a hospital with every unit free.
    pub fn register(&self, hospital_id: HospitalId, totals: &ResourceCounts) -> DispatchResult<()> {
        self.restore(hospital_id, totals, &ResourceCounts::new())
    }

    /// Track a hospital whose `outstanding` units are already held by grants.
    pub fn restore(
        &self,
        hospital_id: HospitalId,
        totals: &ResourceCounts,
        outstanding: &ResourceCounts,
    ) -> DispatchResult<()> {
        let mut pools = BTreeMap::new();
        for kind in ResourceKind::ALL {
            let total = totals.get(&kind).copied().unwrap_or(0);
            let held = outstanding.get(&kind).copied().unwrap_or(0);
            if held > total {
                return Err(DispatchError::Validation(format!(
                    "hospital {hospital_id}: {held} {kind}s held but capacity is {total}"
                )));
            }
            pools.insert(
                kind,
                PoolSnapshot {
                    total,
                    available: total - held,
                },
            );
        }

        let mut hospitals = self.hospitals.write();
        if hospitals.contains_key(&hospital_id) {
            return Err(DispatchError::Validation(format!(
                "hospital {hospital_id} already tracked by the ledger"
            )));
        }
        hospitals.insert(hospital_id, Arc::new(Mutex::new(HospitalPools { pools, retired: false })));
        tracing::debug!(hospital_id, ?totals, ?outstanding, "ledger tracking hospital");
        Ok(())
    }

    /// Whether the hospital is tracked.
    pub fn contains(&self, hospital_id: HospitalId) -> bool {
        self.hospitals.read().contains_key(&hospital_id)
    }

    /// Tracked hospital ids.
    pub fn hospital_ids(&self) -> Vec<HospitalId> {
        let mut ids: Vec<_> = self.hospitals.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn hospital(&self, hospital_id: HospitalId) -> DispatchResult<Arc<Mutex<HospitalPools>>> {
        self.hospitals
            .read()
            .get(&hospital_id)
            .cloned()
            .ok_or_else(|| DispatchError::not_found("hospital", hospital_id))
    }

    fn lock<'a>(
        &self,
        hospital_id: HospitalId,
        pools: &'a Mutex<HospitalPools>,
    ) -> DispatchResult<MutexGuard<'a, HospitalPools>> {
        pools.try_lock_for(self.lock_timeout).ok_or_else(|| {
            tracing::warn!(hospital_id, timeout_ms = ?self.lock_timeout, "ledger lock wait timed out");
            DispatchError::ConcurrentConflict(format!("hospital {hospital_id} ledger is busy"))
        })
    }

    /// Point-in-time totals and availability.
    pub fn snapshot(&self, hospital_id: HospitalId) -> DispatchResult<BTreeMap<ResourceKind, PoolSnapshot>> {
        let hospital = self.hospital(hospital_id)?;
        let guard = self.lock(hospital_id, &hospital)?;
        Ok(guard.pools.clone())
    }

    /// Point-in-time free units per kind.
    pub fn available_snapshot(&self, hospital_id: HospitalId) -> DispatchResult<ResourceCounts> {
        Ok(self
            .snapshot(hospital_id)?
            .into_iter()
            .map(|(kind, pool)| (kind, pool.available))
            .collect())
    }

    /// Take `deltas` units atomically. Either every kind is debited or none is.
    pub fn try_debit(&self, hospital_id: HospitalId, deltas: &ResourceCounts) -> DispatchResult<()> {
        let hospital = self.hospital(hospital_id)?;
        let mut guard = self.lock(hospital_id, &hospital)?;
        if guard.retired {
            return Err(DispatchError::not_found("hospital", hospital_id));
        }

        for (&kind, &count) in deltas {
            let pool = guard.pool_mut(kind)?;
            if count > pool.available {
                return Err(DispatchError::UnsafeAllocation {
                    kind,
                    requested: count,
                    available: pool.available,
                });
            }
        }
        for (&kind, &count) in deltas {
            guard.pool_mut(kind)?.available -= count;
        }
        tracing::debug!(hospital_id, ?deltas, "ledger debited");
        Ok(())
    }

    /// Return units, never raising `available` above `total`. Returns the
    /// units actually credited per kind.
    ///
    /// Never fails on contention; see the module docs.
    pub fn credit(&self, hospital_id: HospitalId, deltas: &ResourceCounts) -> DispatchResult<ResourceCounts> {
        let hospital = self.hospital(hospital_id)?;
        let mut guard = hospital.lock();

        let mut applied = ResourceCounts::new();
        for (&kind, &count) in deltas {
            let pool = guard.pool_mut(kind)?;
            let room = pool.total - pool.available;
            let credited = count.min(room);
            if credited < count {
                tracing::warn!(hospital_id, %kind, count, credited, "credit clamped at capacity");
            }
            pool.available += credited;
            applied.insert(kind, credited);
        }
        tracing::debug!(hospital_id, ?applied, "ledger credited");
        Ok(applied)
    }

    /// Change capacity of one kind while keeping held units held. Shrinking
    /// below the units in use is rejected.
    pub fn resize(&self, hospital_id: HospitalId, kind: ResourceKind, new_total: u32) -> DispatchResult<PoolSnapshot> {
        let pools = self.resize_all(hospital_id, &ResourceCounts::from([(kind, new_total)]))?;
        pools
            .get(&kind)
            .copied()
            .ok_or_else(|| DispatchError::Validation(format!("resource kind {kind} is not tracked")))
    }

    /// Change capacity of several kinds at once. Either every kind is resized
    /// or none is.
    pub fn resize_all(
        &self,
        hospital_id: HospitalId,
        totals: &ResourceCounts,
    ) -> DispatchResult<BTreeMap<ResourceKind, PoolSnapshot>> {
        let hospital = self.hospital(hospital_id)?;
        let mut guard = self.lock(hospital_id, &hospital)?;

        for (&kind, &new_total) in totals {
            let in_use = guard.pool_mut(kind)?.in_use();
            if new_total < in_use {
                return Err(DispatchError::Validation(format!(
                    "cannot shrink {kind}s to {new_total}: {in_use} in use"
                )));
            }
        }
        for (&kind, &new_total) in totals {
            let pool = guard.pool_mut(kind)?;
            pool.available = new_total - pool.in_use();
            pool.total = new_total;
        }
        tracing::info!(hospital_id, ?totals, "ledger capacity resized");
        Ok(guard.pools.clone())
    }

    /// Stop tracking a hospital. Refused while any unit is in use. Returns
    /// the final pools.
    pub fn remove(&self, hospital_id: HospitalId) -> DispatchResult<BTreeMap<ResourceKind, PoolSnapshot>> {
        let mut hospitals = self.hospitals.write();
        let hospital = hospitals
            .get(&hospital_id)
            .cloned()
            .ok_or_else(|| DispatchError::not_found("hospital", hospital_id))?;
        let mut guard = self.lock(hospital_id, &hospital)?;
        if let Some((kind, pool)) = guard.pools.iter().find(|(_, pool)| pool.in_use() > 0) {
            return Err(DispatchError::Validation(format!(
                "hospital {hospital_id} still holds {} {kind}s",
                pool.in_use()
            )));
        }
        guard.retired = true;
        let pools = guard.pools.clone();
        drop(guard);
        hospitals.remove(&hospital_id);
        tracing::info!(hospital_id, "ledger stopped tracking hospital");
        Ok(pools)
    }
}
