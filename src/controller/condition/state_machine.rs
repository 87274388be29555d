//! # Condition State Machine
//!
//! Computes the next `BackupBucketsReady` condition from the previous one.
//!
//! | Observation | Previous                                   | Result                              |
//! |-------------|--------------------------------------------|-------------------------------------|
//! | Ready       | any                                        | True / Available                    |
//! | Error, Gone | absent, True, or another reason            | Progressing / target reason, `now`  |
//! | Error, Gone | Progressing, same reason, threshold passed | False or Unknown, `now`             |
//! | Error, Gone | Progressing, same reason, within threshold | unchanged                           |
//! | Error, Gone | terminal, same reason                      | unchanged                           |
//!
//! `lastTransitionTime` moves only when status or reason change.

use super::helpers::initial_condition;
use super::{Classification, Observation};
use crate::config::{ConditionSettings, ControllerConfig};
use crate::crd::{Condition, ConditionStatus};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Compute the next condition
///
/// Pure function of its arguments: calling it twice with the same inputs yields
/// the same condition.
pub fn transition(
    previous: Option<&Condition>,
    observation: &Observation,
    now: DateTime<Utc>,
    threshold: Duration,
    settings: &ConditionSettings,
) -> Condition {
    let previous = previous
        .cloned()
        .unwrap_or_else(|| initial_condition(settings, now));

    match observation.classification {
        Classification::Ready => update(
            &previous,
            ConditionStatus::True,
            &settings.reason_available,
            observation,
            now,
        ),
        Classification::Error => debounce(
            &previous,
            ConditionStatus::False,
            &settings.reason_error,
            observation,
            now,
            threshold,
        ),
        Classification::Gone => debounce(
            &previous,
            ConditionStatus::Unknown,
            &settings.reason_gone,
            observation,
            now,
            threshold,
        ),
    }
}

/// Delay until the condition should be evaluated again
///
/// While Progressing, the next pass is scheduled for the end of the grace
/// period (never sooner than `min_requeue_interval`), capped by the sync period
/// so promotion happens at most one sync period after the threshold expires.
pub fn requeue_after(condition: &Condition, now: DateTime<Utc>, config: &ControllerConfig) -> Duration {
    if condition.status != ConditionStatus::Progressing {
        return config.sync_period;
    }

    let remaining = config
        .condition_threshold
        .saturating_sub(elapsed_since(condition.last_transition_time, now));

    remaining
        .max(config.min_requeue_interval)
        .min(config.sync_period)
}

fn debounce(
    previous: &Condition,
    terminal: ConditionStatus,
    reason: &str,
    observation: &Observation,
    now: DateTime<Utc>,
    threshold: Duration,
) -> Condition {
    if previous.reason != reason {
        return update(previous, ConditionStatus::Progressing, reason, observation, now);
    }

    let status = match previous.status {
        ConditionStatus::Progressing
            if elapsed_since(previous.last_transition_time, now) >= threshold =>
        {
            terminal
        }
        ConditionStatus::Progressing => ConditionStatus::Progressing,
        status if status == terminal => terminal,
        _ => ConditionStatus::Progressing,
    };

    update(previous, status, reason, observation, now)
}

fn update(
    previous: &Condition,
    status: ConditionStatus,
    reason: &str,
    observation: &Observation,
    now: DateTime<Utc>,
) -> Condition {
    let transitioned = previous.status != status || previous.reason != reason;
    let updated = transitioned
        || previous.message != observation.message
        || previous.codes != observation.codes;

    Condition {
        r#type: previous.r#type.clone(),
        status,
        reason: reason.to_string(),
        message: observation.message.clone(),
        last_transition_time: if transitioned {
            now
        } else {
            previous.last_transition_time
        },
        last_update_time: if updated {
            Some(now)
        } else {
            previous.last_update_time
        },
        codes: observation.codes.clone(),
    }
}

// Negative elapsed time (clock skew) counts as zero.
fn elapsed_since(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    now.signed_duration_since(since)
        .to_std()
        .unwrap_or(Duration::ZERO)
}
