//! # Kubernetes Store
//!
//! [`ObjectStore`] backed by the Kubernetes API server.
//!
//! Reads come from reflector caches kept current by the controller's watches.
//! Only status writes go to the API server.

use super::{ObjectStore, StoreError};
use crate::constants::FIELD_MANAGER;
use crate::crd::{BackupBucket, Condition, Seed};
use async_trait::async_trait;
use kube::api::{Patch, PatchParams};
use kube::{Api, ResourceExt};
use kube_runtime::reflector::{ObjectRef, Store};
use tracing::debug;

/// Store reading from reflector caches and writing through `kube::Api`
#[derive(Clone)]
pub struct KubeStore {
    api: Api<Seed>,
    seeds: Store<Seed>,
    backup_buckets: Store<BackupBucket>,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore")
            .field("cached_seeds", &self.seeds.len())
            .field("cached_backup_buckets", &self.backup_buckets.len())
            .finish_non_exhaustive()
    }
}

impl KubeStore {
    pub fn new(api: Api<Seed>, seeds: Store<Seed>, backup_buckets: Store<BackupBucket>) -> Self {
        Self {
            api,
            seeds,
            backup_buckets,
        }
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get_seed(&self, name: &str) -> Result<Option<Seed>, StoreError> {
        self.seeds
            .wait_until_ready()
            .await
            .map_err(|e| StoreError::Transient(format!("Seed cache: {e}")))?;
        Ok(self
            .seeds
            .get(&ObjectRef::new(name))
            .map(|seed| Seed::clone(&seed)))
    }

    async fn list_backup_buckets(&self, seed_name: &str) -> Result<Vec<BackupBucket>, StoreError> {
        // An empty cache before the initial list would read as "no buckets"
        self.backup_buckets
            .wait_until_ready()
            .await
            .map_err(|e| StoreError::Transient(format!("BackupBucket cache: {e}")))?;
        Ok(buckets_of_seed(&self.backup_buckets.state(), seed_name))
    }

    async fn update_seed_conditions(
        &self,
        seed: &Seed,
        conditions: Vec<Condition>,
    ) -> Result<Seed, StoreError> {
        let name = seed.name_any();

        // A merge patch carrying metadata.resourceVersion is rejected with 409
        // if the object changed in between. Lists are replaced as a whole.
        let patch = match seed.resource_version() {
            Some(resource_version) => serde_json::json!({
                "metadata": { "resourceVersion": resource_version },
                "status": { "conditions": conditions }
            }),
            None => serde_json::json!({
                "status": { "conditions": conditions }
            }),
        };

        debug!(seed = %name, "patching Seed status conditions");
        self.api
            .patch_status(
                &name,
                &PatchParams {
                    field_manager: Some(FIELD_MANAGER.to_string()),
                    ..PatchParams::default()
                },
                &Patch::Merge(patch),
            )
            .await
            .map_err(|e| from_kube_error("Seed", &name, e))
    }
}

fn buckets_of_seed(buckets: &[std::sync::Arc<BackupBucket>], seed_name: &str) -> Vec<BackupBucket> {
    buckets
        .iter()
        .filter(|bucket| bucket.seed_name() == Some(seed_name))
        .map(|bucket| BackupBucket::clone(bucket))
        .collect()
}

fn from_kube_error(kind: &'static str, name: &str, error: kube::Error) -> StoreError {
    match error {
        kube::Error::Api(api_err) if api_err.code == 404 => StoreError::NotFound {
            kind,
            name: name.to_string(),
        },
        kube::Error::Api(api_err) if api_err.code == 409 => StoreError::Conflict {
            kind,
            name: name.to_string(),
            message: api_err.message.clone(),
        },
        other => StoreError::Transient(format!("{kind} '{name}': {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{BackupBucketProvider, BackupBucketSpec, SecretReference};
    use kube::core::ErrorResponse;
    use std::sync::Arc;

    fn api_error(code: u16, reason: &str, message: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: message.to_string(),
            reason: reason.to_string(),
            code,
        })
    }

    fn bucket(name: &str, seed_name: Option<&str>) -> Arc<BackupBucket> {
        Arc::new(BackupBucket::new(
            name,
            BackupBucketSpec {
                seed_name: seed_name.map(ToString::to_string),
                provider: BackupBucketProvider {
                    r#type: "providerType".to_string(),
                    region: "region".to_string(),
                },
                secret_ref: SecretReference {
                    name: "secretName".to_string(),
                    namespace: "garden".to_string(),
                },
            },
        ))
    }

    #[test]
    fn test_not_found_maps_to_not_found() {
        let err = from_kube_error(
            "Seed",
            "seed",
            api_error(404, "NotFound", "seeds.core.gardener.cloud \"seed\" not found"),
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn test_conflict_maps_to_conflict() {
        let err = from_kube_error(
            "Seed",
            "seed",
            api_error(
                409,
                "Conflict",
                "the object has been modified; please apply your changes to the latest version and try again",
            ),
        );
        assert!(err.is_conflict());
        match err {
            StoreError::Conflict { kind, name, message } => {
                assert_eq!(kind, "Seed");
                assert_eq!(name, "seed");
                assert!(message.starts_with("the object has been modified"));
            }
            other => panic!("expected a conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_other_api_errors_are_transient() {
        let err = from_kube_error(
            "Seed",
            "seed",
            api_error(500, "InternalError", "etcdserver: request timed out"),
        );
        assert!(matches!(err, StoreError::Transient(_)));
        assert!(!err.is_conflict());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_cached_buckets_are_filtered_by_seed() {
        let cached = vec![
            bucket("foo-1", Some("seed-a")),
            bucket("foo-2", Some("seed-b")),
            bucket("foo-3", None),
            bucket("foo-4", Some("seed-a")),
        ];

        let mut names: Vec<String> = buckets_of_seed(&cached, "seed-a")
            .iter()
            .map(ResourceExt::name_any)
            .collect();
        names.sort();
        assert_eq!(names, vec!["foo-1".to_string(), "foo-4".to_string()]);
    }
}
