//! BackupBuckets Check Integration Tests
//!
//! - `harness` - in-memory store, fake clock and the in-memory controller loop
//! - `scenarios` - healthy, failing, deleted and missing BackupBuckets

pub mod harness;
mod scenarios;
