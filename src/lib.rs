//! BackupBuckets Check Controller Library
//!
//! Derives the `BackupBucketsReady` condition of `Seed` resources from the
//! aggregate health of the `BackupBucket` resources that reference them.
//!
//! The condition logic lives in [`controller::condition`] and is free of I/O.
//! The [`controller::reconciler`] drives it against an [`store::ObjectStore`],
//! and [`runtime`] runs it under a `kube_runtime` controller.
//! Tests are included in the module files.

pub mod clock;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod runtime;
pub mod store;

// Re-export CRD types for convenience
pub use crd::*;
