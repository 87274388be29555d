//! # Custom Resource Definitions
//!
//! CRD types consumed by the controller.
//!
//! `Seed` is the parent resource whose status carries the `BackupBucketsReady`
//! condition. `BackupBucket` is the dependent resource; it references at most one
//! Seed through `spec.seedName` and reports persistent failures in
//! `status.lastError`. Both are cluster-scoped.

mod status;

pub use status::*;

use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Seed Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: core.gardener.cloud/v1beta1
/// kind: Seed
/// metadata:
///   name: aws-eu1
/// spec:
///   provider:
///     type: aws
///     region: eu-west-1
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "Seed",
    group = "core.gardener.cloud",
    version = "v1beta1",
    status = "SeedStatus",
    printcolumn = r#"{"name":"Provider", "type":"string", "jsonPath":".spec.provider.type"}, {"name":"Region", "type":"string", "jsonPath":".spec.provider.region"}, {"name":"BackupBuckets", "type":"string", "jsonPath":".status.conditions[?(@.type==\"BackupBucketsReady\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SeedSpec {
    /// Infrastructure provider of the Seed
    pub provider: SeedProvider,
}

/// Infrastructure provider of a Seed
#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeedProvider {
    /// Provider type (e.g. aws, gcp, azure)
    pub r#type: String,
    /// Provider region
    pub region: String,
}

/// BackupBucket Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: core.gardener.cloud/v1beta1
/// kind: BackupBucket
/// metadata:
///   name: foo-1-x7k2p
/// spec:
///   seedName: aws-eu1
///   provider:
///     type: aws
///     region: eu-west-1
///   secretRef:
///     name: backup-secret
///     namespace: garden
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "BackupBucket",
    group = "core.gardener.cloud",
    version = "v1beta1",
    status = "BackupBucketStatus",
    shortname = "bb",
    printcolumn = r#"{"name":"Seed", "type":"string", "jsonPath":".spec.seedName"}, {"name":"Error", "type":"string", "jsonPath":".status.lastError.description"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct BackupBucketSpec {
    /// Name of the Seed this bucket belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_name: Option<String>,
    /// Provider hosting the bucket
    pub provider: BackupBucketProvider,
    /// Credentials used to access the bucket
    pub secret_ref: SecretReference,
}

/// Provider hosting a BackupBucket
#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupBucketProvider {
    /// Provider type (e.g. aws, gcp, azure)
    pub r#type: String,
    /// Provider region
    pub region: String,
}

/// Reference to a Secret by name and namespace
#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    pub name: String,
    pub namespace: String,
}

impl BackupBucket {
    /// Name of the Seed this bucket belongs to, if any
    pub fn seed_name(&self) -> Option<&str> {
        self.spec.seed_name.as_deref()
    }

    /// Persistent error reported by the bucket's own controller, if any
    pub fn last_error(&self) -> Option<&LastError> {
        self.status.as_ref().and_then(|s| s.last_error.as_ref())
    }
}

impl Seed {
    /// Conditions currently stored on the Seed
    pub fn conditions(&self) -> &[Condition] {
        self.status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::CustomResourceExt;

    #[test]
    fn test_seed_crd_is_cluster_scoped() {
        let crd = Seed::crd();
        assert_eq!(crd.spec.scope, "Cluster");
        assert_eq!(crd.spec.group, "core.gardener.cloud");
        assert_eq!(crd.spec.names.kind, "Seed");
    }

    #[test]
    fn test_backup_bucket_deserializes_last_error() {
        let bucket: BackupBucket = serde_json::from_value(serde_json::json!({
            "apiVersion": "core.gardener.cloud/v1beta1",
            "kind": "BackupBucket",
            "metadata": { "name": "foo-1" },
            "spec": {
                "seedName": "seed-a",
                "provider": { "type": "providerType", "region": "region" },
                "secretRef": { "name": "secretName", "namespace": "garden" }
            },
            "status": { "lastError": { "description": "foo" } }
        }))
        .expect("valid BackupBucket");

        assert_eq!(bucket.seed_name(), Some("seed-a"));
        assert_eq!(bucket.last_error().map(|e| e.description.as_str()), Some("foo"));
    }

    #[test]
    fn test_seed_without_status_has_no_conditions() {
        let seed = Seed::new(
            "seed-a",
            SeedSpec {
                provider: SeedProvider {
                    r#type: "aws".to_string(),
                    region: "eu-west-1".to_string(),
                },
            },
        );
        assert!(seed.conditions().is_empty());
    }
}
