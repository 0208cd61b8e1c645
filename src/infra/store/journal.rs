//! File-backed store using an append-only JSON lines journal.
//!
//! Every mutation is appended as one record and applied to an in-memory
//! working set. Opening a journal replays it from the start.

use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DispatchStore, InMemoryStore};
use crate::core::error::{DispatchError, DispatchResult};
use crate::core::lifecycle::EmergencyRequest;
use crate::core::model::{
    Ambulance, AmbulanceStatus, GrantStatus, Hospital, ResourceGrant, SchedulingPreference,
};
use crate::util::serde::{AmbulanceId, HospitalId, RequestId};

#[derive(Debug, Serialize, Deserialize)]
enum JournalRecord {
    Hospital(Hospital),
    HospitalRemoved { hospital_id: HospitalId },
    Preference(SchedulingPreference),
    Ambulance(Ambulance),
    Request(EmergencyRequest),
    Grants { grants: Vec<ResourceGrant> },
    GrantsReleased { request_id: RequestId, released_at_ms: u128 },
}

fn backend(err: impl std::fmt::Display) -> DispatchError {
    DispatchError::StoreUnavailable(err.to_string())
}

/// Durable store replaying a `<stream>.jsonl` journal on open.
pub struct JournalStore {
    file_path: PathBuf,
    memory: InMemoryStore,
    /// Serializes append-then-apply so the journal order matches memory.
    writer: Mutex<File>,
}

impl JournalStore {
    /// Open or create the journal `<dir>/<stream>.jsonl` and replay it.
    pub fn open(dir: impl AsRef<Path>, stream: &str) -> DispatchResult<Self> {
        let dir = dir.as_ref();
        create_dir_all(dir).map_err(backend)?;
        let file_path = dir.join(format!("{stream}.jsonl"));
        let memory = InMemoryStore::new();
        let replayed = if file_path.exists() {
            Self::replay(&file_path, &memory)?
        } else {
            0
        };
        let writer = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .map_err(backend)?;
        debug!(path = %file_path.display(), replayed, "journal store opened");
        Ok(Self {
            file_path,
            memory,
            writer: Mutex::new(writer),
        })
    }

    /// Path of the journal file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn replay(path: &Path, memory: &InMemoryStore) -> DispatchResult<usize> {
        let file = File::open(path).map_err(backend)?;
        let mut count = 0;
        for line in BufReader::new(file).lines() {
            let line = line.map_err(backend)?;
            if line.trim().is_empty() {
                continue;
            }
            let record: JournalRecord = serde_json::from_str(&line).map_err(backend)?;
            Self::apply(memory, record);
            count += 1;
        }
        Ok(count)
    }

    fn apply(memory: &InMemoryStore, record: JournalRecord) {
        match record {
            JournalRecord::Hospital(hospital) => memory.put_hospital_now(hospital),
            JournalRecord::HospitalRemoved { hospital_id } => {
                memory.remove_hospital_now(hospital_id);
            }
            JournalRecord::Preference(preference) => memory.put_preference_now(preference),
            JournalRecord::Ambulance(ambulance) => memory.put_ambulance_now(ambulance),
            JournalRecord::Request(request) => memory.put_request_now(request),
            JournalRecord::Grants { grants } => memory.insert_grants_now(grants),
            JournalRecord::GrantsReleased {
                request_id,
                released_at_ms,
            } => {
                memory.take_allocated_grants_now(request_id, released_at_ms);
            }
        }
    }

    fn append(file: &mut File, record: &JournalRecord) -> DispatchResult<()> {
        let line = serde_json::to_string(record).map_err(backend)?;
        writeln!(file, "{line}").map_err(backend)?;
        file.flush().map_err(backend)
    }

    fn write(&self, record: JournalRecord) -> DispatchResult<()> {
        let mut file = self.writer.lock();
        Self::append(&mut file, &record)?;
        Self::apply(&self.memory, record);
        Ok(())
    }
}

#[async_trait]
impl DispatchStore for JournalStore {
    async fn put_hospital(&self, hospital: Hospital) -> DispatchResult<()> {
        self.write(JournalRecord::Hospital(hospital))
    }

    async fn hospital(&self, id: HospitalId) -> DispatchResult<Option<Hospital>> {
        self.memory.hospital(id).await
    }

    async fn hospitals(&self) -> DispatchResult<Vec<Hospital>> {
        self.memory.hospitals().await
    }

    async fn remove_hospital(&self, id: HospitalId) -> DispatchResult<bool> {
        let mut file = self.writer.lock();
        if !self.memory.has_hospital_now(id) {
            return Ok(false);
        }
        Self::append(&mut file, &JournalRecord::HospitalRemoved { hospital_id: id })?;
        Ok(self.memory.remove_hospital_now(id))
    }

    async fn put_preference(&self, preference: SchedulingPreference) -> DispatchResult<()> {
        self.write(JournalRecord::Preference(preference))
    }

    async fn preference(&self, hospital_id: HospitalId) -> DispatchResult<Option<SchedulingPreference>> {
        self.memory.preference(hospital_id).await
    }

    async fn insert_ambulance(&self, hospital_id: HospitalId, vehicle_number: String) -> DispatchResult<Ambulance> {
        let mut file = self.writer.lock();
        let ambulance = self.memory.insert_ambulance_now(hospital_id, vehicle_number);
        if let Err(err) = Self::append(&mut file, &JournalRecord::Ambulance(ambulance.clone())) {
            self.memory.forget_ambulance_now(ambulance.id);
            return Err(err);
        }
        Ok(ambulance)
    }

    async fn ambulance(&self, id: AmbulanceId) -> DispatchResult<Option<Ambulance>> {
        self.memory.ambulance(id).await
    }

    async fn ambulances(&self, hospital_id: HospitalId) -> DispatchResult<Vec<Ambulance>> {
        self.memory.ambulances(hospital_id).await
    }

    async fn claim_ambulance(
        &self,
        hospital_id: HospitalId,
        preferred: Option<AmbulanceId>,
    ) -> DispatchResult<Option<Ambulance>> {
        let mut file = self.writer.lock();
        let Some(ambulance) = self.memory.claim_ambulance_now(hospital_id, preferred)? else {
            return Ok(None);
        };
        if let Err(err) = Self::append(&mut file, &JournalRecord::Ambulance(ambulance.clone())) {
            self.memory
                .set_ambulance_status_now(ambulance.id, AmbulanceStatus::Available);
            return Err(err);
        }
        Ok(Some(ambulance))
    }

    async fn release_ambulance(&self, id: AmbulanceId) -> DispatchResult<()> {
        let Some(mut ambulance) = self.memory.ambulance(id).await? else {
            return Ok(());
        };
        ambulance.status = AmbulanceStatus::Available;
        self.write(JournalRecord::Ambulance(ambulance))
    }

    async fn put_request(&self, request: EmergencyRequest) -> DispatchResult<()> {
        self.write(JournalRecord::Request(request))
    }

    async fn request(&self, id: RequestId) -> DispatchResult<Option<EmergencyRequest>> {
        self.memory.request(id).await
    }

    async fn requests(&self) -> DispatchResult<Vec<EmergencyRequest>> {
        self.memory.requests().await
    }

    async fn insert_grants(&self, grants: Vec<ResourceGrant>) -> DispatchResult<()> {
        self.write(JournalRecord::Grants { grants })
    }

    async fn grants(&self, request_id: RequestId) -> DispatchResult<Vec<ResourceGrant>> {
        self.memory.grants(request_id).await
    }

    async fn take_allocated_grants(&self, request_id: RequestId, now_ms: u128) -> DispatchResult<Vec<ResourceGrant>> {
        let mut file = self.writer.lock();
        let pending = self
            .memory
            .grants_now(request_id)
            .into_iter()
            .any(|g| g.status == GrantStatus::Allocated);
        if !pending {
            return Ok(Vec::new());
        }
        Self::append(
            &mut file,
            &JournalRecord::GrantsReleased {
                request_id,
                released_at_ms: now_ms,
            },
        )?;
        Ok(self.memory.take_allocated_grants_now(request_id, now_ms))
    }

    async fn allocated_grants(&self, hospital_id: HospitalId) -> DispatchResult<Vec<ResourceGrant>> {
        self.memory.allocated_grants(hospital_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::serde::{GeoPoint, ResourceCounts, ResourceKind};

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("rapidaid-journal-{}", uuid::Uuid::new_v4()))
    }

    fn hospital(id: HospitalId) -> Hospital {
        Hospital {
            id,
            name: format!("Hospital {id}"),
            address: String::new(),
            phone: None,
            location: GeoPoint::new(0.0, 0.0),
            capacity: ResourceCounts::from([(ResourceKind::Ambulance, 2)]),
            created_at_ms: 1,
        }
    }

    #[tokio::test]
    async fn replay_restores_fleet_and_released_grants() {
        let dir = temp_dir();
        let request_id = RequestId::new_v4();
        {
            let store = JournalStore::open(&dir, "dispatch").unwrap();
            store.put_hospital(hospital(7)).await.unwrap();
            store.insert_ambulance(7, "AMB-1".into()).await.unwrap();
            let claimed = store.claim_ambulance(7, None).await.unwrap().unwrap();
            assert_eq!(claimed.status, AmbulanceStatus::Assigned);
            store
                .insert_grants(vec![ResourceGrant {
                    request_id,
                    hospital_id: 7,
                    kind: ResourceKind::Ambulance,
                    count: 1,
                    status: GrantStatus::Allocated,
                    allocated_at_ms: 5,
                    released_at_ms: None,
                }])
                .await
                .unwrap();
            assert_eq!(store.take_allocated_grants(request_id, 42).await.unwrap().len(), 1);
            assert!(store.take_allocated_grants(request_id, 43).await.unwrap().is_empty());
        }

        let reopened = JournalStore::open(&dir, "dispatch").unwrap();
        assert_eq!(reopened.hospitals().await.unwrap().len(), 1);
        let fleet = reopened.ambulances(7).await.unwrap();
        assert_eq!(fleet.len(), 1);
        assert_eq!(fleet[0].status, AmbulanceStatus::Assigned);
        let grants = reopened.grants(request_id).await.unwrap();
        assert_eq!(grants[0].status, GrantStatus::Released);
        assert_eq!(grants[0].released_at_ms, Some(42));

        let next = reopened.insert_ambulance(7, "AMB-2".into()).await.unwrap();
        assert!(next.id > fleet[0].id);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn removed_hospital_stays_removed_after_replay() {
        let dir = temp_dir();
        {
            let store = JournalStore::open(&dir, "dispatch").unwrap();
            store.put_hospital(hospital(1)).await.unwrap();
            store.put_hospital(hospital(2)).await.unwrap();
            store.insert_ambulance(1, "AMB-1".into()).await.unwrap();
            store.insert_ambulance(2, "AMB-2".into()).await.unwrap();
            assert!(store.remove_hospital(1).await.unwrap());
            assert!(!store.remove_hospital(1).await.unwrap());
        }

        let reopened = JournalStore::open(&dir, "dispatch").unwrap();
        let ids: Vec<_> = reopened.hospitals().await.unwrap().iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![2]);
        assert!(reopened.ambulances(1).await.unwrap().is_empty());
        assert_eq!(reopened.ambulances(2).await.unwrap().len(), 1);

        let _ = std::fs::remove_dir_all(dir);
    }
}
