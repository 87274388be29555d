//! # In-Memory Loop
//!
//! Runs the reconciler against an [`InMemoryStore`] with the scheduling of the
//! Kubernetes controller.
//!
//! Store events are mirrored into a reflector cache of Seeds and turned into
//! reconcile requests for [`applier`], the engine behind `Controller::run`.
//! Requests therefore coalesce per Seed, a Seed is never reconciled twice at
//! once, and requeues and the error policy behave as in the cluster.

use crate::controller::reconciler::Reconciler;
use crate::crd::Seed;
use crate::runtime::error_policy::handle_reconciliation_error;
use crate::runtime::watch_loop::{log_reconcile_result, reconcile_seed};
use crate::store::{InMemoryStore, StoreEvent};
use futures::{stream, FutureExt, StreamExt};
use kube::ResourceExt;
use kube_runtime::applier;
use kube_runtime::controller;
use kube_runtime::reflector::{self, store::Writer, ObjectRef};
use kube_runtime::watcher::Event;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

/// Reconcile the Seeds of `store` as they change
///
/// Runs until the task is aborted or the store's event channel closes.
pub async fn run_in_memory_loop(store: Arc<InMemoryStore>, reconciler: Arc<Reconciler>) {
    let events = store.subscribe();
    let (seed_cache, mut seed_writer) = reflector::store::<Seed>();
    let initial = resync(&store, &mut seed_writer);

    let changes = stream::unfold(
        (events, seed_writer, Arc::clone(&store)),
        |(mut events, mut writer, store)| async move {
            let seeds = match events.recv().await {
                Ok(event) => mirror_event(&event, &store, &mut writer),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "store event receiver lagged, resyncing all Seeds");
                    resync(&store, &mut writer)
                }
                Err(RecvError::Closed) => {
                    debug!("store event channel closed");
                    return None;
                }
            };
            Some((stream::iter(seeds), (events, writer, store)))
        },
    )
    .flatten();
    let requests = stream::iter(initial)
        .chain(changes)
        .map(Ok::<_, Infallible>);

    let concurrency = u16::try_from(reconciler.config.concurrent_syncs).unwrap_or(u16::MAX);
    applier(
        |seed, ctx| reconcile_seed(seed, ctx).boxed(),
        handle_reconciliation_error,
        reconciler,
        seed_cache,
        requests,
        controller::Config::default().concurrency(concurrency),
    )
    .for_each(|result| {
        log_reconcile_result(result);
        futures::future::ready(())
    })
    .await;
}

/// Apply a store event to the Seed cache and return the Seeds it triggers
fn mirror_event(
    event: &StoreEvent,
    store: &InMemoryStore,
    writer: &mut Writer<Seed>,
) -> Vec<ObjectRef<Seed>> {
    match event {
        StoreEvent::Seed { name } => {
            let seed_ref = ObjectRef::new(name);
            match store.seed(name) {
                Some(seed) => writer.apply_watcher_event(&Event::Apply(seed)),
                None => {
                    if let Some(cached) = writer.as_reader().get(&seed_ref) {
                        writer.apply_watcher_event(&Event::Delete(Seed::clone(&cached)));
                    }
                }
            }
            vec![seed_ref]
        }
        StoreEvent::BackupBucket { seed_name, .. } => seed_name
            .as_deref()
            .map(ObjectRef::new)
            .into_iter()
            .collect(),
    }
}

/// Relist every Seed into the cache and trigger all of them
fn resync(store: &InMemoryStore, writer: &mut Writer<Seed>) -> Vec<ObjectRef<Seed>> {
    let seeds = store.seeds();
    writer.apply_watcher_event(&Event::Init);
    for seed in &seeds {
        writer.apply_watcher_event(&Event::InitApply(seed.clone()));
    }
    writer.apply_watcher_event(&Event::InitDone);
    seeds
        .iter()
        .map(|seed| ObjectRef::new(&seed.name_any()))
        .collect()
}
