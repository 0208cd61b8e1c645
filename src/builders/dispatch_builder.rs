//! Build a dispatcher from configuration and an existing store.

use std::sync::Arc;

use tracing::info;

use crate::config::DispatchConfig;
use crate::core::{DispatchError, DispatchResult, Dispatcher};
use crate::infra::store::DispatchStore;
use crate::util::clock::Clock;

/// Build a dispatcher over `store`.
///
/// Hospitals already persisted are tracked in the ledger with their
/// allocated grants counted as held. Seed hospitals from the configuration
/// are registered unless the store already has them.
pub async fn build_dispatcher<S: DispatchStore>(
    cfg: &DispatchConfig,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
) -> DispatchResult<Dispatcher<S>> {
    cfg.validate()
        .map_err(|e| DispatchError::Validation(format!("config invalid: {e}")))?;

    let dispatcher = Dispatcher::new(store, cfg, clock)?;

    let mut restored = 0;
    for hospital in dispatcher.store().hospitals().await? {
        let outstanding = dispatcher.outstanding_grants(hospital.id).await?;
        dispatcher
            .ledger()
            .restore(hospital.id, &hospital.capacity, &outstanding)?;
        restored += 1;
    }

    let mut seeded = 0;
    for seed in &cfg.hospitals {
        if dispatcher.ledger().contains(seed.id) {
            continue;
        }
        dispatcher.register_hospital(seed.clone()).await?;
        seeded += 1;
    }

    info!(restored, seeded, default_policy = %cfg.scheduling.default_policy, "dispatcher ready");
    Ok(dispatcher)
}
