//! BackupBuckets Check Integration Tests
//!
//! These tests run the full controller loop against the in-memory store:
//! 1. Store change events become reconcile requests for the kube-runtime applier
//! 2. The applier reconciles Seeds, which write the BackupBucketsReady condition
//! 3. A fake clock is stepped past the condition threshold
//! 4. The resulting conditions are verified through the store
//!
//! Run with: `cargo test --test integration_backupbuckets_check`

#[path = "integration/backupbuckets_check/mod.rs"]
mod backupbuckets_check;

pub use backupbuckets_check::*;
