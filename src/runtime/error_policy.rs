//! # Error Policy
//!
//! Error handling and backoff logic for failed reconciliations and watch streams.
//! [`handle_reconciliation_error`] is the controller's error policy.

use crate::controller::backoff::BackoffState;
use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::Seed;
use crate::observability;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Handle a failed reconciliation of `seed`
///
/// Conflicts are retried immediately and leave the backoff untouched. Other
/// errors grow the Seed's exponential backoff, which is tracked per Seed so one
/// failing Seed never delays another.
pub fn handle_reconciliation_error(
    seed: Arc<Seed>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    Action::requeue(retry_delay(&seed.name_any(), error, &ctx))
}

fn retry_delay(seed_name: &str, error: &ReconcilerError, reconciler: &Reconciler) -> Duration {
    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.reconciliation_error",
        seed = seed_name,
        error = %error
    );
    let _error_guard = error_span.enter();

    observability::metrics::increment_reconciliation_errors();

    if error.is_conflict() {
        info!("Seed changed during reconciliation, retrying immediately");
        observability::metrics::increment_requeues_total("conflict");
        return Duration::ZERO;
    }

    let config = &reconciler.config;
    let (delay, error_count) = match reconciler.backoff_states.lock() {
        Ok(mut states) => {
            let state = states
                .entry(seed_name.to_string())
                .or_insert_with(|| BackoffState::new(config.backoff_base, config.backoff_max));
            state.increment_error();
            (state.backoff.next_backoff(), state.error_count)
        }
        Err(e) => {
            warn!("Failed to lock backoff_states: {}, using maximum backoff", e);
            (config.backoff_max, 0)
        }
    };

    error!(
        "Reconciliation failed: {}; retrying in {:?} (error count: {})",
        error, delay, error_count
    );
    observability::metrics::increment_requeues_total("error-backoff");
    delay
}

/// Forget the backoff of `seed_name` after a successful reconciliation
pub fn reset_backoff(seed_name: &str, reconciler: &Reconciler) {
    match reconciler.backoff_states.lock() {
        Ok(mut states) => {
            states.remove(seed_name);
        }
        Err(e) => warn!("Failed to lock backoff_states: {}", e),
    }
}

/// Log a watch stream error with a hint at its likely cause
///
/// The watchers retry on their own with backoff; this only classifies.
pub fn handle_watch_stream_error(error_string: &str) {
    let error_span = tracing::span!(
        tracing::Level::WARN,
        "controller.watch.error",
        error = %error_string
    );
    let _error_guard = error_span.enter();

    observability::metrics::increment_watch_errors();

    match classify_watch_error(error_string) {
        WatchErrorKind::Unauthorized => error!(
            "Watch is not authorized - verify the controller's ClusterRole allows list/watch of Seeds and BackupBuckets: {}",
            error_string
        ),
        WatchErrorKind::Expired => warn!("Watch expired (410), the watcher will re-list"),
        WatchErrorKind::Throttled => warn!("API server is throttling the watch (429), backing off"),
        WatchErrorKind::Other => error!("Watch failed: {}", error_string),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchErrorKind {
    Unauthorized,
    Expired,
    Throttled,
    Other,
}

fn classify_watch_error(error_string: &str) -> WatchErrorKind {
    let is_401 = error_string.contains("401") || error_string.contains("Unauthorized");
    let is_403 = error_string.contains("403") || error_string.contains("Forbidden");
    let is_410 = error_string.contains("410")
        || error_string.contains("too old resource version")
        || error_string.contains("Expired");
    let is_429 = error_string.contains("429")
        || error_string.contains("storage is (re)initializing")
        || error_string.contains("TooManyRequests");

    if is_401 || is_403 {
        WatchErrorKind::Unauthorized
    } else if is_410 {
        WatchErrorKind::Expired
    } else if is_429 {
        WatchErrorKind::Throttled
    } else {
        WatchErrorKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::config::ControllerConfig;
    use crate::crd::{SeedProvider, SeedSpec};
    use crate::store::{InMemoryStore, StoreError};

    fn reconciler() -> Arc<Reconciler> {
        Arc::new(Reconciler::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(SystemClock),
            ControllerConfig::default(),
        ))
    }

    fn seed(name: &str) -> Arc<Seed> {
        Arc::new(Seed::new(
            name,
            SeedSpec {
                provider: SeedProvider {
                    r#type: "providerType".to_string(),
                    region: "region".to_string(),
                },
            },
        ))
    }

    fn transient() -> ReconcilerError {
        ReconcilerError::GetSeed(StoreError::Transient("connection refused".to_string()))
    }

    fn fail(name: &str, error: &ReconcilerError, reconciler: &Arc<Reconciler>) -> Action {
        handle_reconciliation_error(seed(name), error, Arc::clone(reconciler))
    }

    #[test]
    fn test_transient_errors_back_off_exponentially() {
        let reconciler = reconciler();
        let actions: Vec<Action> = (0..3).map(|_| fail("seed", &transient(), &reconciler)).collect();
        assert_eq!(
            actions,
            vec![
                Action::requeue(Duration::from_secs(1)),
                Action::requeue(Duration::from_secs(2)),
                Action::requeue(Duration::from_secs(4)),
            ]
        );
    }

    #[test]
    fn test_backoff_is_per_seed() {
        let reconciler = reconciler();
        fail("seed-a", &transient(), &reconciler);
        fail("seed-a", &transient(), &reconciler);
        assert_eq!(
            fail("seed-b", &transient(), &reconciler),
            Action::requeue(Duration::from_secs(1))
        );
    }

    #[test]
    fn test_conflict_retries_immediately_without_growing_backoff() {
        let reconciler = reconciler();
        fail("seed", &transient(), &reconciler);

        let conflict = ReconcilerError::UpdateStatus(StoreError::Conflict {
            kind: "Seed",
            name: "seed".to_string(),
            message: "the object has been modified".to_string(),
        });
        assert_eq!(
            fail("seed", &conflict, &reconciler),
            Action::requeue(Duration::ZERO)
        );
        assert_eq!(
            fail("seed", &transient(), &reconciler),
            Action::requeue(Duration::from_secs(2))
        );
    }

    #[test]
    fn test_reset_backoff_after_success() {
        let reconciler = reconciler();
        fail("seed", &transient(), &reconciler);
        fail("seed", &transient(), &reconciler);
        reset_backoff("seed", &reconciler);
        assert_eq!(
            fail("seed", &transient(), &reconciler),
            Action::requeue(Duration::from_secs(1))
        );
    }

    #[test]
    fn test_classify_watch_errors() {
        assert_eq!(
            classify_watch_error("ApiError: Forbidden (403)"),
            WatchErrorKind::Unauthorized
        );
        assert_eq!(
            classify_watch_error("too old resource version: 12 (34)"),
            WatchErrorKind::Expired
        );
        assert_eq!(
            classify_watch_error("ApiError: TooManyRequests (429)"),
            WatchErrorKind::Throttled
        );
        assert_eq!(
            classify_watch_error("connection reset by peer"),
            WatchErrorKind::Other
        );
    }
}
