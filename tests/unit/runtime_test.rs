//! Tests for runtime spawner, sweeper and API helpers

use std::sync::Arc;
use std::time::Duration;

use rapidaid_dispatch::config::DispatchConfig;
use rapidaid_dispatch::core::{DispatchError, Dispatcher, HospitalRegistration, RequestStatus};
use rapidaid_dispatch::infra::InMemoryStore;
use rapidaid_dispatch::runtime::{
    health, submit_emergency, EmergencySubmission, ErrorBody, Spawn, StaleRequestSweeper, TokioSpawner,
};
use rapidaid_dispatch::util::{GeoPoint, ManualClock, PriorityClass};

use crate::support::{Fault, FaultyStore};

async fn dispatcher(clock: Arc<ManualClock>) -> Arc<Dispatcher<InMemoryStore>> {
    let dispatcher = Dispatcher::new(Arc::new(InMemoryStore::new()), &DispatchConfig::default(), clock).unwrap();
    dispatcher
        .register_hospital(HospitalRegistration::new(1, "General", GeoPoint::new(0.0, 0.0)))
        .await
        .unwrap();
    Arc::new(dispatcher)
}

fn submission(symptoms: &str) -> EmergencySubmission {
    EmergencySubmission {
        patient: "p-9".to_string(),
        symptoms: symptoms.to_string(),
        latitude: 0.0,
        longitude: 0.1,
        hospital_id: 1,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[tokio::test]
async fn test_submit_emergency_reports_queue_position() {
    let dispatcher = dispatcher(Arc::new(ManualClock::new(0))).await;

    let low = submit_emergency(&dispatcher, submission("sprained wrist")).await.unwrap();
    assert_eq!(low.priority, PriorityClass::Low);
    assert_eq!(low.queue_position, Some(0));
    assert_eq!(low.estimated_arrival_minutes, 34);

    let critical = submit_emergency(&dispatcher, submission("cardiac arrest")).await.unwrap();
    assert_eq!(critical.status, RequestStatus::Pending);
    assert_eq!(critical.queue_position, Some(0));
}

#[tokio::test]
async fn test_submit_emergency_maps_errors() {
    let dispatcher = dispatcher(Arc::new(ManualClock::new(0))).await;
    let body = submit_emergency(&dispatcher, submission("  ")).await.unwrap_err();
    assert_eq!(body.code, "validation");
    assert!(!body.retryable);

    let no_capacity = ErrorBody::from(DispatchError::UnsafeAllocation {
        kind: rapidaid_dispatch::util::ResourceKind::Ambulance,
        requested: 1,
        available: 0,
    });
    assert_eq!(no_capacity.code, "no_resources");
    assert!(no_capacity.retryable);
}

#[tokio::test]
async fn test_health_reports_store_failure() {
    let dispatcher = dispatcher(Arc::new(ManualClock::new(0))).await;
    let ok = health(&dispatcher).await.unwrap();
    assert!(ok.ok);
    assert_eq!(ok.hospitals, 1);

    let store = Arc::new(FaultyStore::new());
    store.fail(Fault::ListHospitals);
    let offline = Dispatcher::new(store, &DispatchConfig::default(), Arc::new(ManualClock::new(0))).unwrap();
    let body = health(&offline).await.unwrap_err();
    assert_eq!(body.code, "store_unavailable");
}

#[tokio::test]
async fn test_sweep_once_cancels_only_stale_requests() {
    let clock = Arc::new(ManualClock::new(0));
    let dispatcher = dispatcher(clock.clone()).await;
    let old = submit_emergency(&dispatcher, submission("fever")).await.unwrap();
    clock.advance_minutes(30);
    let fresh = submit_emergency(&dispatcher, submission("fever")).await.unwrap();
    clock.advance_minutes(31);

    let sweeper = StaleRequestSweeper::new(Arc::clone(&dispatcher), Duration::from_secs(1), Duration::from_secs(3600));
    assert_eq!(sweeper.sweep_once().await.unwrap(), 1);

    let old = dispatcher.request(old.request_id).await.unwrap();
    assert_eq!(old.status, RequestStatus::Cancelled);
    assert!(old.close_reason.is_some());
    assert_eq!(dispatcher.request(fresh.request_id).await.unwrap().status, RequestStatus::Pending);
    assert_eq!(sweeper.sweep_once().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_spawned_sweeper_stops_on_request() {
    let clock = Arc::new(ManualClock::new(0));
    let dispatcher = dispatcher(clock.clone()).await;
    let stale = submit_emergency(&dispatcher, submission("fever")).await.unwrap();
    clock.advance_minutes(120);

    let sweeper = StaleRequestSweeper::new(Arc::clone(&dispatcher), Duration::from_millis(10), Duration::from_secs(60));
    let handle = sweeper.spawn(&TokioSpawner::current());

    let mut cancelled = false;
    for _ in 0..200 {
        if dispatcher.request(stale.request_id).await.unwrap().status == RequestStatus::Cancelled {
            cancelled = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(cancelled, "sweeper never ran");

    handle.stop();
    assert!(handle.is_stopped());
}
