//! End-to-end condition scenarios.

use super::harness::{backup_bucket, last_error, seed, Harness, THRESHOLD};
use backupbuckets_check_controller::clock::Clock;
use backupbuckets_check_controller::ConditionStatus;
use std::time::Duration;

fn past_threshold() -> Duration {
    THRESHOLD + Duration::from_secs(1)
}

#[tokio::test]
async fn test_failing_bucket_becomes_false_after_threshold() {
    let h = Harness::start();
    h.store.create_backup_bucket(backup_bucket("foo-1", "seed")).unwrap();
    h.store.create_backup_bucket(backup_bucket("foo-2", "seed")).unwrap();
    h.store.create_seed(seed("seed")).unwrap();

    let ready = h
        .eventually("seed", "True", |c| c.status == ConditionStatus::True)
        .await;
    assert_eq!(ready.reason, "BackupBucketsAvailable");
    assert_eq!(ready.message, "Backup Buckets are available.");

    h.store
        .update_backup_bucket_status("foo-1", last_error("foo", &["ERR_INFRA_UNAUTHORIZED"]))
        .unwrap();
    let progressing = h
        .eventually("seed", "Progressing", |c| {
            c.status == ConditionStatus::Progressing
        })
        .await;
    assert_eq!(progressing.reason, "BackupBucketsError");
    assert_eq!(
        progressing.message,
        "The following BackupBuckets have issues:\n* foo-1: foo"
    );
    assert_eq!(progressing.codes, vec!["ERR_INFRA_UNAUTHORIZED".to_string()]);

    // Still within the grace period
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        h.condition("seed").map(|c| c.status),
        Some(ConditionStatus::Progressing)
    );

    h.clock.step(past_threshold());
    let failed = h
        .eventually("seed", "False", |c| c.status == ConditionStatus::False)
        .await;
    assert_eq!(failed.reason, "BackupBucketsError");
    assert_eq!(failed.last_transition_time, h.clock.now());

    h.stop().await;
}

#[tokio::test]
async fn test_deleted_buckets_become_unknown_after_threshold() {
    let h = Harness::start();
    h.store.create_backup_bucket(backup_bucket("foo-1", "seed")).unwrap();
    h.store.create_backup_bucket(backup_bucket("foo-2", "seed")).unwrap();
    h.store.create_seed(seed("seed")).unwrap();
    h.eventually("seed", "True", |c| c.status == ConditionStatus::True)
        .await;

    h.store.delete_backup_bucket("foo-1").unwrap();
    h.store.delete_backup_bucket("foo-2").unwrap();
    let progressing = h
        .eventually("seed", "Progressing", |c| {
            c.status == ConditionStatus::Progressing
        })
        .await;
    assert_eq!(progressing.reason, "BackupBucketsGone");
    assert_eq!(progressing.message, "Backup Buckets are gone.");

    h.clock.step(past_threshold());
    let unknown = h
        .eventually("seed", "Unknown", |c| c.status == ConditionStatus::Unknown)
        .await;
    assert_eq!(unknown.reason, "BackupBucketsGone");

    h.stop().await;
}

#[tokio::test]
async fn test_seed_without_buckets_is_progressing_gone() {
    let h = Harness::start();
    h.store.create_backup_bucket(backup_bucket("bar", "other-seed")).unwrap();
    h.store.create_seed(seed("seed")).unwrap();

    let condition = h
        .eventually("seed", "Progressing", |c| {
            c.status == ConditionStatus::Progressing
        })
        .await;
    assert_eq!(condition.reason, "BackupBucketsGone");

    h.stop().await;
}

#[tokio::test]
async fn test_recovery_is_immediate() {
    let h = Harness::start();
    h.store.create_backup_bucket(backup_bucket("foo-1", "seed")).unwrap();
    h.store
        .update_backup_bucket_status("foo-1", last_error("foo", &[]))
        .unwrap();
    h.store.create_seed(seed("seed")).unwrap();
    h.eventually("seed", "Progressing/BackupBucketsError", |c| {
        c.status == ConditionStatus::Progressing && c.reason == "BackupBucketsError"
    })
    .await;

    h.clock.step(past_threshold());
    h.eventually("seed", "False", |c| c.status == ConditionStatus::False)
        .await;

    h.store.update_backup_bucket_status("foo-1", None).unwrap();
    let recovered = h
        .eventually("seed", "True", |c| c.status == ConditionStatus::True)
        .await;
    assert_eq!(recovered.reason, "BackupBucketsAvailable");
    assert!(recovered.codes.is_empty());

    h.stop().await;
}

#[tokio::test]
async fn test_transient_store_errors_are_retried() {
    let h = Harness::start();
    h.store.set_unavailable(true);
    h.store.create_backup_bucket(backup_bucket("foo-1", "seed")).unwrap();
    h.store.create_seed(seed("seed")).unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(h.condition("seed").is_none());

    h.store.set_unavailable(false);
    h.eventually("seed", "True", |c| c.status == ConditionStatus::True)
        .await;

    h.stop().await;
}

#[tokio::test]
async fn test_deleted_seed_does_not_stop_other_seeds() {
    let h = Harness::start();
    h.store.create_backup_bucket(backup_bucket("foo-a", "seed-a")).unwrap();
    h.store.create_backup_bucket(backup_bucket("foo-b", "seed-b")).unwrap();
    h.store.create_seed(seed("seed-a")).unwrap();
    h.store.create_seed(seed("seed-b")).unwrap();
    h.eventually("seed-a", "True", |c| c.status == ConditionStatus::True)
        .await;

    h.store.delete_seed("seed-a").unwrap();
    h.store
        .update_backup_bucket_status("foo-b", last_error("bar", &[]))
        .unwrap();
    let condition = h
        .eventually("seed-b", "Progressing/BackupBucketsError", |c| {
            c.status == ConditionStatus::Progressing && c.reason == "BackupBucketsError"
        })
        .await;
    assert_eq!(
        condition.message,
        "The following BackupBuckets have issues:\n* foo-b: bar"
    );
    assert!(h.store.seed("seed-a").is_none());

    h.stop().await;
}
