//! # Condition Helpers
//!
//! Lookup and upsert of conditions by type.

use crate::config::ConditionSettings;
use crate::constants::{CONDITION_INITIALIZED_MESSAGE, CONDITION_INITIALIZED_REASON};
use crate::crd::{Condition, ConditionStatus};
use chrono::{DateTime, Utc};

/// Find the condition of the given type
pub fn get_condition<'a>(conditions: &'a [Condition], condition_type: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Insert or replace the condition with the same type, keeping the order of the others
pub fn set_condition(conditions: &mut Vec<Condition>, condition: Condition) {
    match conditions
        .iter_mut()
        .find(|c| c.r#type == condition.r#type)
    {
        Some(existing) => *existing = condition,
        None => conditions.push(condition),
    }
}

/// Placeholder used when a Seed does not carry the condition yet
///
/// Its reason never matches a target reason, so the first evaluation always transitions.
pub fn initial_condition(settings: &ConditionSettings, now: DateTime<Utc>) -> Condition {
    Condition {
        r#type: settings.condition_type.clone(),
        status: ConditionStatus::Unknown,
        reason: CONDITION_INITIALIZED_REASON.to_string(),
        message: CONDITION_INITIALIZED_MESSAGE.to_string(),
        last_transition_time: now,
        last_update_time: Some(now),
        codes: Vec::new(),
    }
}

/// Whether `new` needs to be persisted over `old`
pub fn condition_changed(old: Option<&Condition>, new: &Condition) -> bool {
    match old {
        None => true,
        Some(old) => {
            old.status != new.status
                || old.reason != new.reason
                || old.message != new.message
                || old.codes != new.codes
        }
    }
}
