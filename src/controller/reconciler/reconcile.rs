//! # Reconcile
//!
//! Main reconciliation logic for a single Seed.

use super::types::{Reconciler, ReconcilerError, Requeue};
use crate::controller::condition::{
    classify, condition_changed, get_condition, requeue_after, transition,
};
use crate::observability;
use std::time::Instant;
use tracing::{debug, info_span, warn, Instrument};

impl Reconciler {
    /// Run one reconciliation pass for the Seed called `seed_name`
    pub async fn reconcile(&self, seed_name: &str) -> Result<Requeue, ReconcilerError> {
        let span = info_span!("controller.reconcile", seed = %seed_name);
        async move {
            let start = Instant::now();
            observability::metrics::increment_reconciliations();
            let result = self.reconcile_seed(seed_name).await;
            observability::metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
            result
        }
        .instrument(span)
        .await
    }

    async fn reconcile_seed(&self, seed_name: &str) -> Result<Requeue, ReconcilerError> {
        let Some(seed) = self
            .store
            .get_seed(seed_name)
            .await
            .map_err(ReconcilerError::GetSeed)?
        else {
            debug!("Seed not found, nothing to reconcile");
            return Ok(Requeue::Never);
        };

        let backup_buckets = self
            .store
            .list_backup_buckets(seed_name)
            .await
            .map_err(ReconcilerError::ListBackupBuckets)?;
        let observation = classify(&backup_buckets);
        debug!(
            backup_buckets = backup_buckets.len(),
            classification = observation.classification.as_str(),
            "classified BackupBuckets"
        );

        let now = self.clock.now();
        let settings = &self.config.condition;
        let previous = get_condition(seed.conditions(), &settings.condition_type);
        let next = transition(
            previous,
            &observation,
            now,
            self.config.condition_threshold,
            settings,
        );
        let delay = requeue_after(&next, now, &self.config);

        if condition_changed(previous, &next) {
            match self.write_condition(&seed, previous, next).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    debug!("Seed deleted before its status could be written");
                    return Ok(Requeue::Never);
                }
                Err(e) => {
                    warn!(error = %e, "failed to update Seed status");
                    return Err(ReconcilerError::UpdateStatus(e));
                }
            }
        } else {
            observability::metrics::increment_status_updates("skipped");
            debug!("condition unchanged, skipping status update");
        }

        Ok(Requeue::After(delay))
    }
}
