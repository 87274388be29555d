//! # Status Management
//!
//! Persists the computed condition on the Seed.

use super::types::Reconciler;
use crate::controller::condition::set_condition;
use crate::crd::{Condition, Seed};
use crate::observability;
use crate::store::StoreError;
use tracing::{debug, info};

impl Reconciler {
    /// Write `condition` into the Seed's condition set
    ///
    /// The write is conditional on the resource version of `seed`; conditions of
    /// other types are carried over unchanged.
    pub(super) async fn write_condition(
        &self,
        seed: &Seed,
        previous: Option<&Condition>,
        condition: Condition,
    ) -> Result<(), StoreError> {
        let transitioned = previous
            .is_none_or(|p| p.status != condition.status || p.reason != condition.reason);
        let status = condition.status.as_str();
        let reason = condition.reason.clone();

        let mut conditions = seed.conditions().to_vec();
        set_condition(&mut conditions, condition);

        match self.store.update_seed_conditions(seed, conditions).await {
            Ok(_) => {
                observability::metrics::increment_status_updates("written");
                if transitioned {
                    observability::metrics::increment_condition_transitions(status, &reason);
                    info!(
                        status,
                        reason = %reason,
                        previous_status = previous.map_or("<none>", |p| p.status.as_str()),
                        "condition transitioned"
                    );
                } else {
                    debug!(status, reason = %reason, "condition details updated");
                }
                Ok(())
            }
            Err(e) => {
                if e.is_conflict() {
                    observability::metrics::increment_status_updates("conflict");
                }
                Err(e)
            }
        }
    }
}
