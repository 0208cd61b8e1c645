//! # RapidAid Dispatch
//!
//! Emergency dispatch core: decides which pending emergency request a
//! hospital serves next and whether the hospital can safely commit an
//! ambulance, a doctor and (for severe cases) a room to it.
//!
//! ## Core Problem Solved
//!
//! Requests arrive concurrently against a handful of hospitals with small,
//! hard capacities:
//!
//! - **No oversubscription**: two dispatchers racing for the last ambulance
//!   must not both win
//! - **Per-hospital isolation**: one busy hospital never slows another
//! - **Pluggable ordering**: each hospital picks its own queue discipline
//!   (priority, FCFS, SJF, HRRN)
//! - **Restartable**: held units are rebuilt from persisted grants
//!
//! ## Key Features
//!
//! - **Keyword classifier** mapping free-text symptoms to a priority class
//! - **Queue policies** as a closed enum, recomputed on every read
//! - **Resource ledger** with one `parking_lot::Mutex` per hospital and
//!   all-or-nothing debits
//! - **Admission controller** with an optimistic pre-check, a serialized
//!   debit and bounded conflict retries
//! - **Lifecycle** `pending → assigned → in_progress → completed`, with
//!   cancel and reject
//! - **Stores**: in-memory and JSON-lines journal, plus the Postgres DDL
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rapidaid_dispatch::builders::build_dispatcher;
//! use rapidaid_dispatch::config::DispatchConfig;
//! use rapidaid_dispatch::core::NewEmergencyRequest;
//! use rapidaid_dispatch::infra::InMemoryStore;
//! use rapidaid_dispatch::util::{GeoPoint, SystemClock};
//!
//! let dispatcher = build_dispatcher(
//!     &DispatchConfig::from_env()?,
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(SystemClock),
//! )
//! .await?;
//!
//! let request = dispatcher
//!     .create_request(NewEmergencyRequest {
//!         patient: "p-17".into(),
//!         symptoms: "chest pain and nausea".into(),
//!         location: GeoPoint::new(40.71, -74.00),
//!         hospital_id: 1,
//!     })
//!     .await?;
//! let assigned = dispatcher.dispatch_next(request.hospital_id).await?;
//! ```
//!
//! For complete scenarios, see:
//! - `tests/lifecycle_test.rs` - request lifecycle end to end
//! - `tests/concurrency_test.rs` - racing allocations against one hospital

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Classification, queue policies, ledger, admission and lifecycle.
pub mod core;
/// Configuration models for classification, scheduling and admission.
pub mod config;
/// Builders to construct a dispatcher from configuration.
pub mod builders;
/// Infrastructure adapters for persistence backends.
pub mod infra;
/// Runtime adapters (spawner, sweeper) and API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
