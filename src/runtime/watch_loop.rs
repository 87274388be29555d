//! # Watch Loop
//!
//! Runs the Seed controller until shutdown.
//!
//! Seeds are the controller's primary kind. BackupBuckets are watched through a
//! reflector whose cache also serves the reconciler's reads, and every
//! BackupBucket event triggers the Seed in its `spec.seedName`. BackupBuckets
//! without a Seed trigger nothing.

use crate::clock::SystemClock;
use crate::config::ControllerConfig;
use crate::controller::reconciler::{Reconciler, ReconcilerError, Requeue};
use crate::controller::server::ServerState;
use crate::crd::{BackupBucket, Seed};
use crate::observability;
use crate::runtime::error_policy::{
    handle_reconciliation_error, handle_watch_stream_error, reset_backoff,
};
use crate::store::KubeStore;
use anyhow::Result;
use futures::StreamExt;
use kube::{Api, Client, ResourceExt};
use kube_runtime::controller::{self, Action};
use kube_runtime::reflector::{self, ObjectRef, Store};
use kube_runtime::{watcher, Controller, WatchStreamExt};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Watcher timeout (seconds), below the client's read timeout so idle watches
/// are closed by the API server first
const WATCH_TIMEOUT_SECS: u32 = 25;

/// Watch Seeds and BackupBuckets and reconcile until SIGINT or SIGTERM
///
/// # Errors
///
/// Currently always returns `Ok`; watch and reconcile failures are retried
/// inside the controller.
pub async fn run_watch_loop(
    client: Client,
    config: ControllerConfig,
    server_state: Arc<ServerState>,
) -> Result<()> {
    let seeds: Api<Seed> = Api::all(client.clone());
    let backup_buckets: Api<BackupBucket> = Api::all(client);
    let watcher_config = watcher::Config::default().timeout(WATCH_TIMEOUT_SECS);

    let (bucket_cache, bucket_writer) = reflector::store::<BackupBucket>();
    let bucket_events = reflector::reflector(
        bucket_writer,
        watcher(backup_buckets, watcher_config.clone()),
    )
    .default_backoff()
    .touched_objects();

    let concurrency = u16::try_from(config.concurrent_syncs).unwrap_or(u16::MAX);
    let controller = Controller::new(seeds.clone(), watcher_config)
        .watches_stream(bucket_events, seed_ref_for_bucket)
        .with_config(controller::Config::default().concurrency(concurrency))
        .shutdown_on_signal();

    let seed_cache = controller.store();
    tokio::spawn(mark_ready_when_synced(
        seed_cache.clone(),
        bucket_cache.clone(),
        Arc::clone(&server_state),
    ));

    let store = Arc::new(KubeStore::new(seeds, seed_cache, bucket_cache));
    let reconciler = Arc::new(Reconciler::new(store, Arc::new(SystemClock), config));

    info!("Watching Seeds and BackupBuckets");
    controller
        .run(reconcile_seed, handle_reconciliation_error, reconciler)
        .for_each(|result| {
            log_reconcile_result(result);
            futures::future::ready(())
        })
        .await;

    server_state.caches_synced.store(false, Ordering::Relaxed);
    info!("Controller stopped");
    Ok(())
}

/// The Seed a BackupBucket event should reconcile, if the bucket has one
pub fn seed_ref_for_bucket(bucket: BackupBucket) -> Option<ObjectRef<Seed>> {
    let seed_ref = bucket.seed_name().map(ObjectRef::new);
    if seed_ref.is_none() {
        debug!(backup_bucket = %bucket.name_any(), "BackupBucket has no Seed, ignoring");
    }
    seed_ref
}

/// Reconcile one Seed and turn the outcome into the controller's next action
///
/// # Errors
///
/// Returns the [`ReconcilerError`] of the pass; the error policy decides when
/// to retry.
pub async fn reconcile_seed(seed: Arc<Seed>, ctx: Arc<Reconciler>) -> Result<Action, ReconcilerError> {
    let name = seed.name_any();
    let requeue = ctx.reconcile(&name).await?;
    reset_backoff(&name, &ctx);
    match requeue {
        Requeue::After(_) => observability::metrics::increment_requeues_total("periodic"),
        Requeue::Never => debug!(seed = %name, "Seed is gone, not requeueing"),
    }
    Ok(requeue.into())
}

/// Log the outcome reported by the controller for one reconcile request
pub fn log_reconcile_result<E: std::error::Error>(
    result: Result<(ObjectRef<Seed>, Action), controller::Error<ReconcilerError, E>>,
) {
    match result {
        Ok((seed, action)) => debug!(seed = %seed.name, ?action, "reconciled"),
        // Deleted Seeds drop out of the cache before their queued request runs
        Err(controller::Error::ObjectNotFound(seed)) => {
            debug!(seed = %seed.name, "Seed no longer cached, skipping");
        }
        // Already handled by the error policy
        Err(controller::Error::ReconcilerFailed(_, seed)) => {
            debug!(seed = %seed.name, "reconciliation failed, retry scheduled");
        }
        Err(controller::Error::QueueError(e)) => handle_watch_stream_error(&e.to_string()),
        Err(controller::Error::RunnerError(e)) => error!("Controller runner failed: {}", e),
    }
}

/// Flip readiness once both caches hold their initial list
async fn mark_ready_when_synced(
    seeds: Store<Seed>,
    backup_buckets: Store<BackupBucket>,
    server_state: Arc<ServerState>,
) {
    if let Err(e) = seeds.wait_until_ready().await {
        warn!("Seed cache never became ready: {}", e);
        return;
    }
    if let Err(e) = backup_buckets.wait_until_ready().await {
        warn!("BackupBucket cache never became ready: {}", e);
        return;
    }
    server_state.caches_synced.store(true, Ordering::Relaxed);
    info!(
        seeds = seeds.len(),
        backup_buckets = backup_buckets.len(),
        "Initial Seed and BackupBucket lists synced"
    );
}
