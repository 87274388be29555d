//! # Reconciler Types
//!
//! Shared state and result types of the reconciler.

use crate::clock::Clock;
use crate::config::ControllerConfig;
use crate::controller::backoff::BackoffState;
use crate::store::{ObjectStore, StoreError};
use kube_runtime::controller::Action;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Reconciler context shared by all reconciliations
pub struct Reconciler {
    pub store: Arc<dyn ObjectStore>,
    pub clock: Arc<dyn Clock>,
    pub config: ControllerConfig,
    /// Per-Seed backoff state, keyed by Seed name
    /// Maintained by the error policy, cleared once a Seed reconciles successfully
    pub backoff_states: Mutex<HashMap<String, BackoffState>>,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("clock", &self.clock)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(store: Arc<dyn ObjectStore>, clock: Arc<dyn Clock>, config: ControllerConfig) -> Self {
        Self {
            store,
            clock,
            config,
            backoff_states: Mutex::new(HashMap::new()),
        }
    }
}

/// When the Seed should be reconciled again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requeue {
    After(Duration),
    /// The Seed no longer exists
    Never,
}

impl From<Requeue> for Action {
    fn from(requeue: Requeue) -> Self {
        match requeue {
            Requeue::After(delay) => Action::requeue(delay),
            Requeue::Never => Action::await_change(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("failed to get Seed: {0}")]
    GetSeed(#[source] StoreError),
    #[error("failed to list BackupBuckets: {0}")]
    ListBackupBuckets(#[source] StoreError),
    #[error("failed to update Seed status: {0}")]
    UpdateStatus(#[source] StoreError),
}

impl ReconcilerError {
    pub fn store_error(&self) -> &StoreError {
        match self {
            ReconcilerError::GetSeed(e)
            | ReconcilerError::ListBackupBuckets(e)
            | ReconcilerError::UpdateStatus(e) => e,
        }
    }

    /// The Seed changed underneath the pass; retry immediately
    pub fn is_conflict(&self) -> bool {
        self.store_error().is_conflict()
    }
}
