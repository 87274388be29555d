//! Test harness running the controller loop on an in-memory store.

use backupbuckets_check_controller::clock::{Clock, FakeClock};
use backupbuckets_check_controller::config::ControllerConfig;
use backupbuckets_check_controller::controller::condition::get_condition;
use backupbuckets_check_controller::controller::reconciler::Reconciler;
use backupbuckets_check_controller::runtime::in_memory::run_in_memory_loop;
use backupbuckets_check_controller::store::{InMemoryStore, ObjectStore};
use backupbuckets_check_controller::{
    BackupBucket, BackupBucketProvider, BackupBucketSpec, BackupBucketStatus, Condition,
    LastError, SecretReference, Seed, SeedProvider, SeedSpec,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const CONDITION_TYPE: &str = "BackupBucketsReady";
pub const THRESHOLD: Duration = Duration::from_secs(60);

const EVENTUALLY_TIMEOUT: Duration = Duration::from_secs(5);
const EVENTUALLY_POLL: Duration = Duration::from_millis(10);

pub fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

pub fn seed(name: &str) -> Seed {
    Seed::new(
        name,
        SeedSpec {
            provider: SeedProvider {
                r#type: "providerType".to_string(),
                region: "region".to_string(),
            },
        },
    )
}

pub fn backup_bucket(name: &str, seed_name: &str) -> BackupBucket {
    BackupBucket::new(
        name,
        BackupBucketSpec {
            seed_name: Some(seed_name.to_string()),
            provider: BackupBucketProvider {
                r#type: "providerType".to_string(),
                region: "region".to_string(),
            },
            secret_ref: SecretReference {
                name: "secretName".to_string(),
                namespace: "garden".to_string(),
            },
        },
    )
}

pub fn last_error(description: &str, codes: &[&str]) -> Option<BackupBucketStatus> {
    Some(BackupBucketStatus {
        last_error: Some(LastError {
            description: description.to_string(),
            codes: codes.iter().map(ToString::to_string).collect(),
            last_update_time: None,
        }),
        observed_generation: None,
    })
}

/// Running controller loop
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<FakeClock>,
    controller: JoinHandle<()>,
}

impl Harness {
    /// Start the loop with a short sync period so polling stays fast
    pub fn start() -> Self {
        let config = ControllerConfig {
            sync_period: Duration::from_millis(20),
            min_requeue_interval: Duration::from_millis(10),
            backoff_base: Duration::from_millis(20),
            backoff_max: Duration::from_millis(200),
            concurrent_syncs: 2,
            condition_threshold: THRESHOLD,
            ..ControllerConfig::default()
        };
        config.validate().expect("valid test configuration");

        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FakeClock::new(t0()));
        let reconciler = Arc::new(Reconciler::new(
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            Arc::clone(&clock) as Arc<dyn Clock>,
            config,
        ));

        let controller = tokio::spawn(run_in_memory_loop(Arc::clone(&store), reconciler));

        Self {
            store,
            clock,
            controller,
        }
    }

    pub fn condition(&self, seed_name: &str) -> Option<Condition> {
        let seed = self.store.seed(seed_name)?;
        get_condition(seed.conditions(), CONDITION_TYPE).cloned()
    }

    /// Poll until the Seed's condition satisfies `predicate`
    pub async fn eventually<F>(&self, seed_name: &str, what: &str, predicate: F) -> Condition
    where
        F: Fn(&Condition) -> bool,
    {
        let deadline = tokio::time::Instant::now() + EVENTUALLY_TIMEOUT;
        loop {
            let condition = self.condition(seed_name);
            if let Some(condition) = condition.as_ref().filter(|c| predicate(c)) {
                return condition.clone();
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {what} on Seed '{seed_name}', last condition: {condition:?}"
            );
            tokio::time::sleep(EVENTUALLY_POLL).await;
        }
    }

    pub async fn stop(self) {
        self.controller.abort();
        // Cancellation is the expected outcome
        let _ = self.controller.await;
    }
}
