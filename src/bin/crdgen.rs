//! Prints the Seed and BackupBucket CRDs as a multi-document YAML stream.
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/crds.yaml
//! ```

use backupbuckets_check_controller::{BackupBucket, Seed};
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let crds = [Seed::crd(), BackupBucket::crd()];
    let documents = crds
        .iter()
        .map(serde_yaml::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    print!("{}", documents.join("---\n"));
    Ok(())
}
