//! # Controller Configuration
//!
//! Condition naming, debounce threshold, sync period, worker count and retry backoff.

use super::duration::parse_kubernetes_duration;
use super::{env_var_or_default, ConfigError};
use std::time::Duration;
use tracing::warn;

/// Names written into the managed condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionSettings {
    /// Condition type maintained on Seeds
    pub condition_type: String,
    /// Reason while all BackupBuckets are healthy
    pub reason_available: String,
    /// Reason while at least one BackupBucket reports an error
    pub reason_error: String,
    /// Reason while the Seed has no BackupBuckets
    pub reason_gone: String,
}

impl Default for ConditionSettings {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            condition_type: DEFAULT_CONDITION_TYPE.to_string(),
            reason_available: DEFAULT_REASON_AVAILABLE.to_string(),
            reason_error: DEFAULT_REASON_ERROR.to_string(),
            reason_gone: DEFAULT_REASON_GONE.to_string(),
        }
    }
}

/// Controller configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub condition: ConditionSettings,
    /// Minimum dwell time in Progressing before a negative classification becomes terminal
    pub condition_threshold: Duration,
    /// Baseline delay between reconciliations of a Seed
    pub sync_period: Duration,
    /// Lower bound for requeue delays while the condition is Progressing
    pub min_requeue_interval: Duration,
    /// Maximum number of Seeds reconciled concurrently
    pub concurrent_syncs: usize,
    /// First retry delay after a failed reconciliation
    pub backoff_base: Duration,
    /// Upper bound for retry delays
    pub backoff_max: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            condition: ConditionSettings::default(),
            condition_threshold: Duration::from_millis(DEFAULT_CONDITION_THRESHOLD_MS),
            sync_period: Duration::from_millis(DEFAULT_SYNC_PERIOD_MS),
            min_requeue_interval: Duration::from_millis(DEFAULT_MIN_REQUEUE_INTERVAL_MS),
            concurrent_syncs: DEFAULT_CONCURRENT_SYNCS,
            backoff_base: Duration::from_millis(DEFAULT_BACKOFF_BASE_MS),
            backoff_max: Duration::from_millis(DEFAULT_BACKOFF_MAX_MS),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            condition: ConditionSettings {
                condition_type: env_var_or_default(
                    "CONDITION_TYPE",
                    defaults.condition.condition_type,
                ),
                reason_available: env_var_or_default(
                    "REASON_AVAILABLE",
                    defaults.condition.reason_available,
                ),
                reason_error: env_var_or_default("REASON_ERROR", defaults.condition.reason_error),
                reason_gone: env_var_or_default("REASON_GONE", defaults.condition.reason_gone),
            },
            condition_threshold: env_duration_or_default(
                "CONDITION_THRESHOLD",
                defaults.condition_threshold,
            ),
            sync_period: env_duration_or_default("SYNC_PERIOD", defaults.sync_period),
            min_requeue_interval: env_duration_or_default(
                "MIN_REQUEUE_INTERVAL",
                defaults.min_requeue_interval,
            ),
            concurrent_syncs: env_var_or_default("CONCURRENT_SYNCS", defaults.concurrent_syncs),
            backoff_base: env_duration_or_default("BACKOFF_BASE", defaults.backoff_base),
            backoff_max: env_duration_or_default("BACKOFF_MAX", defaults.backoff_max),
        }
    }

    /// Reject settings the controller cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.condition.condition_type.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "condition type cannot be empty".to_string(),
            ));
        }
        if self.condition_threshold.is_zero() {
            return Err(ConfigError::Invalid(
                "condition threshold must be greater than zero".to_string(),
            ));
        }
        if self.sync_period.is_zero() {
            return Err(ConfigError::Invalid(
                "sync period must be greater than zero".to_string(),
            ));
        }
        if self.min_requeue_interval > self.sync_period {
            return Err(ConfigError::Invalid(format!(
                "minimum requeue interval ({:?}) cannot exceed the sync period ({:?})",
                self.min_requeue_interval, self.sync_period
            )));
        }
        if self.concurrent_syncs == 0 {
            return Err(ConfigError::Invalid(
                "at least one worker is required".to_string(),
            ));
        }
        if self.backoff_base > self.backoff_max {
            return Err(ConfigError::Invalid(format!(
                "backoff base ({:?}) cannot exceed backoff max ({:?})",
                self.backoff_base, self.backoff_max
            )));
        }
        Ok(())
    }
}

/// Read a Kubernetes duration from the environment, falling back to `default`
fn env_duration_or_default(key: &str, default: Duration) -> Duration {
    match std::env::var(key) {
        Ok(value) => match parse_kubernetes_duration(&value) {
            Ok(duration) => duration,
            Err(e) => {
                warn!("Ignoring {}: {}, using default {:?}", key, e, default);
                crate::observability::metrics::increment_duration_parsing_errors();
                default
            }
        },
        Err(_) => default,
    }
}
