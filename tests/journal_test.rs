//! Durability tests for the journal store
//!
//! A dispatcher is stopped mid-flight and rebuilt from the same journal; held
//! units must still be held and releasable.

use std::path::PathBuf;
use std::sync::Arc;

use rapidaid_dispatch::builders::build_dispatcher;
use rapidaid_dispatch::config::DispatchConfig;
use rapidaid_dispatch::core::{HospitalRegistration, NewEmergencyRequest, RequestStatus};
use rapidaid_dispatch::infra::{DispatchStore, JournalStore};
use rapidaid_dispatch::util::{GeoPoint, ManualClock, ResourceKind};

struct TempDir(PathBuf);

impl TempDir {
    fn new() -> Self {
        Self(std::env::temp_dir().join(format!("rapidaid-journal-test-{}", uuid::Uuid::new_v4())))
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn config() -> DispatchConfig {
    DispatchConfig {
        hospitals: vec![HospitalRegistration::new(1, "General", GeoPoint::new(0.0, 0.0))
            .with_capacity(2, 2, 2)
            .with_policy("fcfs")
            .with_fleet(["AMB-1", "AMB-2"])],
        ..DispatchConfig::default()
    }
}

#[tokio::test]
async fn test_restart_preserves_held_units() {
    let dir = TempDir::new();
    let clock = Arc::new(ManualClock::new(0));

    let (held, waiting) = {
        let store = Arc::new(JournalStore::open(&dir.0, "dispatch").unwrap());
        let dispatcher = build_dispatcher(&config(), store, clock.clone()).await.unwrap();
        let mut ids = Vec::new();
        for symptoms in ["heart attack", "fever"] {
            let request = dispatcher
                .create_request(NewEmergencyRequest {
                    patient: "p-1".into(),
                    symptoms: symptoms.into(),
                    location: GeoPoint::new(0.0, 0.2),
                    hospital_id: 1,
                })
                .await
                .unwrap();
            ids.push(request.id);
        }
        dispatcher.assign(ids[0], None).await.unwrap();
        (ids[0], ids[1])
    };

    let store = Arc::new(JournalStore::open(&dir.0, "dispatch").unwrap());
    let dispatcher = build_dispatcher(&config(), Arc::clone(&store), clock).await.unwrap();

    assert_eq!(store.ambulances(1).await.unwrap().len(), 2);
    assert_eq!(dispatcher.preference(1).await.unwrap().policy.as_str(), "fcfs");
    let snapshot = dispatcher.ledger_snapshot(1).unwrap();
    assert_eq!(snapshot[&ResourceKind::Ambulance].available, 1);
    assert_eq!(snapshot[&ResourceKind::Room].available, 1);

    assert_eq!(dispatcher.request(held).await.unwrap().status, RequestStatus::Assigned);
    let queue = dispatcher.queue(1).await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].request_id, waiting);

    dispatcher.complete(held).await.unwrap();
    assert_eq!(dispatcher.ledger_snapshot(1).unwrap()[&ResourceKind::Ambulance].available, 2);
    assert!(store.path().exists());
}
