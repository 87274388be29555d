//! # Object Store
//!
//! Read/list/update access to Seeds and BackupBuckets.
//!
//! The reconciler only talks to [`ObjectStore`]. [`KubeStore`] reads from the
//! controller's watch caches and writes through the Kubernetes API;
//! [`InMemoryStore`] keeps objects in memory and emits change events, which is
//! what the integration tests drive.
//!
//! Status writes are conditional on the resource version the caller last
//! observed. A stale version fails with [`StoreError::Conflict`] and nothing is
//! written.

mod kubernetes;
mod memory;

pub use kubernetes::KubeStore;
pub use memory::{InMemoryStore, StoreEvent};

use crate::crd::{BackupBucket, Condition, Seed};
use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by object stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// The object does not exist
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
    /// The object changed since it was read
    #[error("conflict updating {kind} '{name}': {message}")]
    Conflict {
        kind: &'static str,
        name: String,
        message: String,
    },
    /// Recoverable failure talking to the backing store
    #[error("transient store error: {0}")]
    Transient(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Access to the parent and dependent objects
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Get a Seed by name; `Ok(None)` if it does not exist
    async fn get_seed(&self, name: &str) -> Result<Option<Seed>, StoreError>;

    /// List the BackupBuckets whose `spec.seedName` equals `seed_name`
    async fn list_backup_buckets(&self, seed_name: &str) -> Result<Vec<BackupBucket>, StoreError>;

    /// Replace the Seed's condition set
    ///
    /// Fails with [`StoreError::Conflict`] if the Seed's resource version no
    /// longer matches the one on `seed`.
    async fn update_seed_conditions(
        &self,
        seed: &Seed,
        conditions: Vec<Condition>,
    ) -> Result<Seed, StoreError>;
}
