//! # BackupBuckets Check Controller
//!
//! A Kubernetes controller that maintains the `BackupBucketsReady` condition
//! on every Seed.
//!
//! ## Overview
//!
//! For each Seed the controller looks at the BackupBuckets whose
//! `spec.seedName` points at it:
//!
//! 1. **All healthy** - the condition becomes `True` immediately
//! 2. **Some report an error** - `Progressing`, then `False` once the errors
//!    persist for the condition threshold
//! 3. **None exist** - `Progressing`, then `Unknown` after the threshold
//!
//! Short-lived failures therefore never surface as a failed condition.
//!
//! ## Features
//!
//! - **Debounced conditions**: configurable grace period before negative states
//! - **kube-runtime controller**: one reconciliation per Seed at a time, reads from watch caches
//! - **Optimistic concurrency**: status writes are conditional on the resource version
//! - **Prometheus metrics**: `/metrics`, plus `/healthz` and `/readyz` probes

use anyhow::Result;
use backupbuckets_check_controller::runtime::initialization::initialize;
use backupbuckets_check_controller::runtime::watch_loop::run_watch_loop;

#[tokio::main]
async fn main() -> Result<()> {
    let init_result = initialize().await?;

    run_watch_loop(
        init_result.client,
        init_result.controller_config,
        init_result.server_state,
    )
    .await
}
