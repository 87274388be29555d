//! # Constants
//!
//! Default values for controller configuration, condition naming and the HTTP server.

/// Condition type maintained on Seeds
pub const DEFAULT_CONDITION_TYPE: &str = "BackupBucketsReady";

/// Reason used while all BackupBuckets are healthy
pub const DEFAULT_REASON_AVAILABLE: &str = "BackupBucketsAvailable";

/// Reason used while at least one BackupBucket reports an error
pub const DEFAULT_REASON_ERROR: &str = "BackupBucketsError";

/// Reason used while the Seed has no BackupBuckets
pub const DEFAULT_REASON_GONE: &str = "BackupBucketsGone";

/// Reason of the placeholder condition used before the first evaluation
pub const CONDITION_INITIALIZED_REASON: &str = "ConditionInitialized";

/// Message of the placeholder condition used before the first evaluation
pub const CONDITION_INITIALIZED_MESSAGE: &str = "The condition has not been evaluated yet.";

/// Grace period before a negative classification becomes terminal (milliseconds)
pub const DEFAULT_CONDITION_THRESHOLD_MS: u64 = 60_000;

/// Baseline period between reconciliations of a Seed (milliseconds)
pub const DEFAULT_SYNC_PERIOD_MS: u64 = 500;

/// Lower bound for requeue delays while a condition is Progressing (milliseconds)
pub const DEFAULT_MIN_REQUEUE_INTERVAL_MS: u64 = 100;

/// Maximum number of Seeds reconciled concurrently
pub const DEFAULT_CONCURRENT_SYNCS: usize = 5;

/// First retry delay after a failed reconciliation (milliseconds)
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

/// Upper bound for retry delays after failed reconciliations (milliseconds)
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 300_000;

/// HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// How long to wait for the HTTP server to become ready (seconds)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// How often to poll the HTTP server readiness during startup (milliseconds)
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Field manager used for status writes
pub const FIELD_MANAGER: &str = "backupbuckets-check-controller";
