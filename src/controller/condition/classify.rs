//! # Classification
//!
//! Derives the aggregate health of a Seed's BackupBuckets.

use super::{Classification, Observation};
use crate::crd::BackupBucket;
use kube::ResourceExt;

const MESSAGE_AVAILABLE: &str = "Backup Buckets are available.";
const MESSAGE_GONE: &str = "Backup Buckets are gone.";
const MESSAGE_ERROR_HEADER: &str = "The following BackupBuckets have issues:";

/// Classify the BackupBuckets belonging to one Seed
///
/// An empty list is `Gone`, never `Ready`.
pub fn classify(backup_buckets: &[BackupBucket]) -> Observation {
    if backup_buckets.is_empty() {
        return Observation {
            classification: Classification::Gone,
            message: MESSAGE_GONE.to_string(),
            codes: Vec::new(),
        };
    }

    let mut erroneous: Vec<(String, &str)> = backup_buckets
        .iter()
        .filter_map(|bucket| {
            bucket
                .last_error()
                .map(|e| (bucket.name_any(), e.description.as_str()))
        })
        .collect();

    if erroneous.is_empty() {
        return Observation {
            classification: Classification::Ready,
            message: MESSAGE_AVAILABLE.to_string(),
            codes: Vec::new(),
        };
    }

    erroneous.sort_by(|a, b| a.0.cmp(&b.0));
    let mut message = MESSAGE_ERROR_HEADER.to_string();
    for (name, description) in &erroneous {
        message.push_str(&format!("\n* {name}: {description}"));
    }

    let mut codes: Vec<String> = backup_buckets
        .iter()
        .filter_map(BackupBucket::last_error)
        .flat_map(|e| e.codes.iter().cloned())
        .collect();
    codes.sort();
    codes.dedup();

    Observation {
        classification: Classification::Error,
        message,
        codes,
    }
}
