//! # In-Memory Store
//!
//! [`ObjectStore`] keeping Seeds and BackupBuckets in process memory.
//!
//! Every write bumps a store-wide resource version and publishes a
//! [`StoreEvent`] on a broadcast channel, mirroring what a watch delivers from
//! the API server. Status writes enforce the same optimistic concurrency as the
//! API server: a stale resource version is a conflict.

use super::{ObjectStore, StoreError};
use crate::crd::{BackupBucket, BackupBucketStatus, Condition, Seed, SeedStatus};
use async_trait::async_trait;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::debug;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Change notification published by [`InMemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A Seed was created, updated or deleted
    Seed { name: String },
    /// A BackupBucket was created, updated or deleted
    BackupBucket {
        name: String,
        seed_name: Option<String>,
    },
}

impl StoreEvent {
    /// Seed whose reconciliation this event should trigger
    pub fn seed_name(&self) -> Option<&str> {
        match self {
            StoreEvent::Seed { name } => Some(name),
            StoreEvent::BackupBucket { seed_name, .. } => seed_name.as_deref(),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    seeds: BTreeMap<String, Seed>,
    backup_buckets: BTreeMap<String, BackupBucket>,
    resource_version: u64,
}

impl MemoryState {
    fn next_resource_version(&mut self) -> String {
        self.resource_version += 1;
        self.resource_version.to_string()
    }
}

/// In-process object store with change events
#[derive(Debug)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
    events: broadcast::Sender<StoreEvent>,
    unavailable: AtomicBool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(MemoryState::default()),
            events,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Subscribe to change events
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Make reads and status writes through [`ObjectStore`] fail with a transient error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|e| StoreError::Transient(format!("store lock poisoned: {e}")))
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Transient("store unavailable".to_string()));
        }
        Ok(())
    }

    fn publish(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    pub fn create_seed(&self, mut seed: Seed) -> Result<Seed, StoreError> {
        let name = seed.name_any();
        {
            let mut state = self.lock()?;
            if state.seeds.contains_key(&name) {
                return Err(already_exists("Seed", &name));
            }
            seed.metadata.resource_version = Some(state.next_resource_version());
            seed.metadata.generation = Some(1);
            state.seeds.insert(name.clone(), seed.clone());
        }
        debug!(seed = %name, "created Seed");
        self.publish(StoreEvent::Seed { name });
        Ok(seed)
    }

    /// Replace a Seed, enforcing its resource version
    pub fn update_seed(&self, mut seed: Seed) -> Result<Seed, StoreError> {
        let name = seed.name_any();
        {
            let mut state = self.lock()?;
            let current = state
                .seeds
                .get(&name)
                .ok_or_else(|| not_found("Seed", &name))?;
            check_resource_version("Seed", &name, current, &seed)?;
            seed.metadata.resource_version = Some(state.next_resource_version());
            state.seeds.insert(name.clone(), seed.clone());
        }
        self.publish(StoreEvent::Seed { name });
        Ok(seed)
    }

    pub fn delete_seed(&self, name: &str) -> Result<(), StoreError> {
        self.lock()?
            .seeds
            .remove(name)
            .ok_or_else(|| not_found("Seed", name))?;
        self.publish(StoreEvent::Seed {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Snapshot of a Seed
    pub fn seed(&self, name: &str) -> Option<Seed> {
        self.lock().ok()?.seeds.get(name).cloned()
    }

    /// Snapshot of all Seeds, sorted by name
    pub fn seeds(&self) -> Vec<Seed> {
        self.lock()
            .map(|state| state.seeds.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn create_backup_bucket(&self, mut bucket: BackupBucket) -> Result<BackupBucket, StoreError> {
        let name = bucket.name_any();
        {
            let mut state = self.lock()?;
            if state.backup_buckets.contains_key(&name) {
                return Err(already_exists("BackupBucket", &name));
            }
            bucket.metadata.resource_version = Some(state.next_resource_version());
            state.backup_buckets.insert(name.clone(), bucket.clone());
        }
        self.publish(StoreEvent::BackupBucket {
            name,
            seed_name: bucket.spec.seed_name.clone(),
        });
        Ok(bucket)
    }

    /// Replace the status of a BackupBucket
    pub fn update_backup_bucket_status(
        &self,
        name: &str,
        status: Option<BackupBucketStatus>,
    ) -> Result<BackupBucket, StoreError> {
        let bucket = {
            let mut state = self.lock()?;
            let resource_version = state.next_resource_version();
            let bucket = state
                .backup_buckets
                .get_mut(name)
                .ok_or_else(|| not_found("BackupBucket", name))?;
            bucket.status = status;
            bucket.metadata.resource_version = Some(resource_version);
            bucket.clone()
        };
        self.publish(StoreEvent::BackupBucket {
            name: name.to_string(),
            seed_name: bucket.spec.seed_name.clone(),
        });
        Ok(bucket)
    }

    pub fn delete_backup_bucket(&self, name: &str) -> Result<(), StoreError> {
        let bucket = self
            .lock()?
            .backup_buckets
            .remove(name)
            .ok_or_else(|| not_found("BackupBucket", name))?;
        self.publish(StoreEvent::BackupBucket {
            name: name.to_string(),
            seed_name: bucket.spec.seed_name,
        });
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get_seed(&self, name: &str) -> Result<Option<Seed>, StoreError> {
        self.check_available()?;
        Ok(self.lock()?.seeds.get(name).cloned())
    }

    async fn list_backup_buckets(&self, seed_name: &str) -> Result<Vec<BackupBucket>, StoreError> {
        self.check_available()?;
        Ok(self
            .lock()?
            .backup_buckets
            .values()
            .filter(|bucket| bucket.seed_name() == Some(seed_name))
            .cloned()
            .collect())
    }

    async fn update_seed_conditions(
        &self,
        seed: &Seed,
        conditions: Vec<Condition>,
    ) -> Result<Seed, StoreError> {
        self.check_available()?;
        let name = seed.name_any();
        let updated = {
            let mut state = self.lock()?;
            let resource_version = state.next_resource_version();
            let current = state
                .seeds
                .get_mut(&name)
                .ok_or_else(|| not_found("Seed", &name))?;
            check_resource_version("Seed", &name, &*current, seed)?;

            let status = current.status.get_or_insert_with(SeedStatus::default);
            status.conditions = conditions;
            current.metadata.resource_version = Some(resource_version);
            current.clone()
        };
        self.publish(StoreEvent::Seed { name });
        Ok(updated)
    }
}

fn check_resource_version(
    kind: &'static str,
    name: &str,
    current: &impl ResourceExt,
    incoming: &impl ResourceExt,
) -> Result<(), StoreError> {
    match incoming.resource_version() {
        Some(expected) if current.resource_version().as_deref() != Some(expected.as_str()) => {
            Err(StoreError::Conflict {
                kind,
                name: name.to_string(),
                message: format!(
                    "the object has been modified; expected resourceVersion {expected}, found {}",
                    current.resource_version().unwrap_or_default()
                ),
            })
        }
        _ => Ok(()),
    }
}

fn not_found(kind: &'static str, name: &str) -> StoreError {
    StoreError::NotFound {
        kind,
        name: name.to_string(),
    }
}

fn already_exists(kind: &'static str, name: &str) -> StoreError {
    StoreError::Conflict {
        kind,
        name: name.to_string(),
        message: "already exists".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{
        BackupBucketProvider, BackupBucketSpec, SecretReference, SeedProvider, SeedSpec,
    };

    fn seed(name: &str) -> Seed {
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

    fn bucket(name: &str, seed_name: Option<&str>) -> BackupBucket {
        BackupBucket::new(
            name,
            BackupBucketSpec {
                seed_name: seed_name.map(ToString::to_string),
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

    #[tokio::test]
    async fn test_list_filters_by_seed_name() {
        let store = InMemoryStore::new();
        store.create_backup_bucket(bucket("foo-1", Some("seed-a"))).unwrap();
        store.create_backup_bucket(bucket("foo-2", Some("seed-b"))).unwrap();
        store.create_backup_bucket(bucket("foo-3", None)).unwrap();

        let buckets = store.list_backup_buckets("seed-a").await.unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].name_any(), "foo-1");
    }

    #[tokio::test]
    async fn test_stale_status_write_conflicts() {
        let store = InMemoryStore::new();
        let stale = store.create_seed(seed("seed-a")).unwrap();

        // Someone else updates the Seed in between
        store.update_seed(stale.clone()).unwrap();

        let err = store
            .update_seed_conditions(&stale, vec![])
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_status_write_bumps_resource_version() {
        let store = InMemoryStore::new();
        let created = store.create_seed(seed("seed-a")).unwrap();
        let updated = store.update_seed_conditions(&created, vec![]).await.unwrap();
        assert_ne!(created.resource_version(), updated.resource_version());
        assert_eq!(
            store.seed("seed-a").and_then(|s| s.resource_version()),
            updated.resource_version()
        );
    }

    #[tokio::test]
    async fn test_events_carry_owning_seed() {
        let store = InMemoryStore::new();
        let mut events = store.subscribe();
        store.create_backup_bucket(bucket("foo-1", Some("seed-a"))).unwrap();
        store.delete_backup_bucket("foo-1").unwrap();

        for _ in 0..2 {
            let event = events.recv().await.unwrap();
            assert_eq!(event.seed_name(), Some("seed-a"));
        }
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_transiently() {
        let store = InMemoryStore::new();
        store.set_unavailable(true);
        let err = store.get_seed("seed-a").await.unwrap_err();
        assert!(matches!(err, StoreError::Transient(_)));
    }
}
