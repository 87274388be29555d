//! # BackupBucketsReady Condition
//!
//! Pure logic deriving the `BackupBucketsReady` condition of a Seed.
//!
//! - [`classify`] turns the Seed's BackupBuckets into an [`Observation`]
//! - [`transition`] combines the observation with the previous condition, the
//!   current time and the grace period threshold into the next condition
//! - the helpers read and upsert conditions by type
//!
//! Healthy observations are reflected immediately. Negative observations enter
//! `Progressing` first and only become `False`/`Unknown` once they have persisted
//! for the whole threshold.

mod classify;
mod helpers;
mod state_machine;

pub use classify::classify;
pub use helpers::{condition_changed, get_condition, initial_condition, set_condition};
pub use state_machine::{requeue_after, transition};

/// Aggregate health of the BackupBuckets of a Seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// All BackupBuckets report no error
    Ready,
    /// At least one BackupBucket reports an error
    Error,
    /// The Seed has no BackupBuckets
    Gone,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Ready => "ready",
            Classification::Error => "error",
            Classification::Gone => "gone",
        }
    }
}

/// Classification plus the details written into the condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub classification: Classification,
    pub message: String,
    /// Sorted, de-duplicated error codes of erroneous BackupBuckets
    pub codes: Vec<String>,
}
