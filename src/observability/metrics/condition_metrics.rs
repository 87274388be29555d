//! # Condition Metrics
//!
//! Metrics for condition transitions, Seed status writes and configuration parsing.

use crate::observability::metrics::registry::REGISTRY;
use anyhow::Result;
use prometheus::{IntCounter, IntCounterVec};
use std::sync::LazyLock;

static CONDITION_TRANSITIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "backupbuckets_check_condition_transitions_total",
            "Total number of condition status or reason changes",
        ),
        &["status", "reason"],
    )
    .expect("Failed to create CONDITION_TRANSITIONS_TOTAL metric - this should never happen")
});

// outcome: written, skipped, conflict
static STATUS_UPDATES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "backupbuckets_check_status_updates_total",
            "Total number of Seed status updates by outcome",
        ),
        &["outcome"],
    )
    .expect("Failed to create STATUS_UPDATES_TOTAL metric - this should never happen")
});

static DURATION_PARSING_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "backupbuckets_check_duration_parsing_errors_total",
        "Total number of invalid duration settings that fell back to defaults",
    )
    .expect("Failed to create DURATION_PARSING_ERRORS_TOTAL metric - this should never happen")
});

/// Register condition metrics with the registry
pub(crate) fn register_condition_metrics() -> Result<()> {
    REGISTRY.register(Box::new(CONDITION_TRANSITIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STATUS_UPDATES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DURATION_PARSING_ERRORS_TOTAL.clone()))?;
    Ok(())
}

pub fn increment_condition_transitions(status: &str, reason: &str) {
    CONDITION_TRANSITIONS_TOTAL
        .with_label_values(&[status, reason])
        .inc();
}

pub fn increment_status_updates(outcome: &str) {
    STATUS_UPDATES_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn increment_duration_parsing_errors() {
    DURATION_PARSING_ERRORS_TOTAL.inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_condition_transitions() {
        let before = CONDITION_TRANSITIONS_TOTAL
            .with_label_values(&["Progressing", "UnitTestReason"])
            .get();
        increment_condition_transitions("Progressing", "UnitTestReason");
        let after = CONDITION_TRANSITIONS_TOTAL
            .with_label_values(&["Progressing", "UnitTestReason"])
            .get();
        assert_eq!(after, before + 1);
    }

    #[test]
    fn test_increment_status_updates() {
        let before = STATUS_UPDATES_TOTAL.with_label_values(&["unit-test"]).get();
        increment_status_updates("unit-test");
        assert_eq!(
            STATUS_UPDATES_TOTAL.with_label_values(&["unit-test"]).get(),
            before + 1
        );
    }

    #[test]
    fn test_increment_duration_parsing_errors() {
        let before = DURATION_PARSING_ERRORS_TOTAL.get();
        increment_duration_parsing_errors();
        assert!(DURATION_PARSING_ERRORS_TOTAL.get() > before);
    }
}
