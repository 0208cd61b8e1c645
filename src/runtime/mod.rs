//! Runtime adapters and API surface.

pub mod api;
pub mod spawner;
#[cfg(feature = "tokio-runtime")]
pub mod sweeper;

pub use api::{health, submit_emergency, EmergencySubmission, ErrorBody, Health, SubmissionReceipt};
pub use spawner::Spawn;
#[cfg(feature = "tokio-runtime")]
pub use spawner::TokioSpawner;
#[cfg(feature = "tokio-runtime")]
pub use sweeper::{StaleRequestSweeper, SweeperHandle};
