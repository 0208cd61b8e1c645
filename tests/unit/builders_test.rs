//! Tests for builder modules

use std::sync::Arc;

use rapidaid_dispatch::builders::build_dispatcher;
use rapidaid_dispatch::config::DispatchConfig;
use rapidaid_dispatch::core::{DispatchError, HospitalRegistration, NewEmergencyRequest};
use rapidaid_dispatch::infra::{DispatchStore, InMemoryStore};
use rapidaid_dispatch::util::{GeoPoint, ManualClock, ResourceKind};

fn seeded_config() -> DispatchConfig {
    DispatchConfig {
        hospitals: vec![HospitalRegistration::new(1, "General", GeoPoint::new(0.0, 0.0))
            .with_capacity(2, 4, 4)
            .with_fleet(["AMB-1", "AMB-2"])],
        ..DispatchConfig::default()
    }
}

#[tokio::test]
async fn test_build_dispatcher_registers_seeds() {
    let store = Arc::new(InMemoryStore::new());
    let dispatcher = build_dispatcher(&seeded_config(), Arc::clone(&store), Arc::new(ManualClock::new(0)))
        .await
        .expect("dispatcher");

    assert_eq!(dispatcher.ledger().hospital_ids(), vec![1]);
    assert_eq!(store.ambulances(1).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_build_dispatcher_restores_held_units() {
    let store = Arc::new(InMemoryStore::new());
    let cfg = seeded_config();
    let clock = Arc::new(ManualClock::new(0));

    let first = build_dispatcher(&cfg, Arc::clone(&store), clock.clone()).await.unwrap();
    let request = first
        .create_request(NewEmergencyRequest {
            patient: "p-1".into(),
            symptoms: "head injury".into(),
            location: GeoPoint::new(0.0, 0.05),
            hospital_id: 1,
        })
        .await
        .unwrap();
    first.assign(request.id, None).await.unwrap();
    drop(first);

    let second = build_dispatcher(&cfg, Arc::clone(&store), clock).await.unwrap();
    let snapshot = second.ledger_snapshot(1).unwrap();
    assert_eq!(snapshot[&ResourceKind::Ambulance].available, 1);
    assert_eq!(snapshot[&ResourceKind::Room].available, 3);
    assert_eq!(store.ambulances(1).await.unwrap().len(), 2, "seed fleet registered twice");

    second.complete(request.id).await.unwrap();
    assert_eq!(second.ledger_snapshot(1).unwrap()[&ResourceKind::Ambulance].available, 2);
}

#[tokio::test]
async fn test_build_dispatcher_rejects_invalid_config() {
    let cfg = DispatchConfig {
        stale_pending_secs: 0,
        ..DispatchConfig::default()
    };
    let err = build_dispatcher(&cfg, Arc::new(InMemoryStore::new()), Arc::new(ManualClock::new(0)))
        .await
        .err()
        .expect("invalid config");
    assert!(matches!(err, DispatchError::Validation(_)));
}
