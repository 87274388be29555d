//! # Reconciler
//!
//! One reconciliation pass for one Seed:
//!
//! 1. read the Seed (gone: nothing to do)
//! 2. list the BackupBuckets referencing it
//! 3. classify them and run the condition state machine
//! 4. persist the condition set if it changed
//! 5. tell the caller when to look again
//!
//! Store errors are returned to the caller, which decides between an
//! immediate retry (conflicts) and backoff (everything else).

mod reconcile;
mod status;
mod types;

pub use types::{Reconciler, ReconcilerError, Requeue};
