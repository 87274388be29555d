//! # seedctl
//!
//! Command-line interface for inspecting the `BackupBucketsReady` condition
//! maintained by the BackupBuckets Check Controller.
//!
//! ## Usage
//!
//! ```bash
//! # List all Seeds with their BackupBucketsReady condition
//! seedctl list
//!
//! # Show all conditions and BackupBuckets of a Seed
//! seedctl status --name aws-eu1
//!
//! # List the BackupBuckets of a Seed
//! seedctl buckets --seed aws-eu1
//!
//! # Trigger a reconciliation of a Seed
//! seedctl reconcile --name aws-eu1
//! ```

use anyhow::{Context, Result};
use backupbuckets_check_controller::constants::DEFAULT_CONDITION_TYPE;
use backupbuckets_check_controller::controller::condition::get_condition;
use backupbuckets_check_controller::{BackupBucket, Seed};
use clap::{Parser, Subcommand};
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::{Client, ResourceExt};
use serde_json::json;

/// Annotation bumped by `seedctl reconcile`; any Seed change triggers a reconciliation
const RECONCILE_ANNOTATION: &str = "backupbuckets-check.gardener.cloud/reconcile";

/// BackupBuckets Check Controller CLI
#[derive(Parser)]
#[command(name = "seedctl")]
#[command(about = "Inspect the BackupBucketsReady condition of Seeds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Condition type maintained by the controller
    #[arg(long, global = true, default_value = DEFAULT_CONDITION_TYPE)]
    condition_type: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List all Seeds with their condition
    List,
    /// Show all conditions and BackupBuckets of a Seed
    Status {
        /// Name of the Seed
        #[arg(short, long)]
        name: String,
    },
    /// List the BackupBuckets referencing a Seed
    Buckets {
        /// Name of the Seed
        #[arg(short, long)]
        seed: String,
    },
    /// Trigger a reconciliation of a Seed
    Reconcile {
        /// Name of the Seed
        #[arg(short, long)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seedctl=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;

    match cli.command {
        Commands::List => list_command(client, &cli.condition_type).await,
        Commands::Status { name } => status_command(client, &name).await,
        Commands::Buckets { seed } => buckets_command(client, &seed).await,
        Commands::Reconcile { name } => reconcile_command(client, &name).await,
    }
}

/// List all Seeds with the status and reason of the condition
async fn list_command(client: Client, condition_type: &str) -> Result<()> {
    let api: Api<Seed> = Api::all(client);
    let seeds = api
        .list(&ListParams::default())
        .await
        .context("Failed to list Seeds")?;

    if seeds.items.is_empty() {
        println!("No Seeds found.");
        return Ok(());
    }

    println!(
        "{:<30} {:<12} {:<25} {:<25}",
        "NAME", "STATUS", "REASON", "LAST TRANSITION"
    );
    println!("{}", "-".repeat(92));

    for seed in &seeds.items {
        let (status, reason, since) = match get_condition(seed.conditions(), condition_type) {
            Some(c) => (
                c.status.to_string(),
                c.reason.clone(),
                c.last_transition_time.to_rfc3339(),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        println!(
            "{:<30} {:<12} {:<25} {:<25}",
            seed.name_any(),
            status,
            reason,
            since
        );
    }

    Ok(())
}

/// Show all conditions of a Seed and the BackupBuckets referencing it
async fn status_command(client: Client, name: &str) -> Result<()> {
    let seeds: Api<Seed> = Api::all(client.clone());
    let seed = seeds
        .get(name)
        .await
        .with_context(|| format!("Failed to get Seed '{name}'"))?;

    println!("Seed: {}", seed.name_any());
    println!(
        "  Provider: {} ({})",
        seed.spec.provider.r#type, seed.spec.provider.region
    );

    if seed.conditions().is_empty() {
        println!("\nConditions: none (the Seed may not have been reconciled yet)");
    } else {
        println!("\nConditions:");
        for condition in seed.conditions() {
            println!("  {}: {}", condition.r#type, condition.status);
            println!("    Reason: {}", condition.reason);
            for (i, line) in condition.message.lines().enumerate() {
                let label = if i == 0 { "Message:" } else { "        " };
                println!("    {label} {line}");
            }
            if !condition.codes.is_empty() {
                println!("    Codes: {}", condition.codes.join(", "));
            }
            println!(
                "    Last Transition: {}",
                condition.last_transition_time.to_rfc3339()
            );
            if let Some(last_update_time) = condition.last_update_time {
                println!("    Last Update: {}", last_update_time.to_rfc3339());
            }
        }
    }

    println!();
    print_buckets(&list_buckets(client, name).await?);
    Ok(())
}

/// List the BackupBuckets referencing a Seed
async fn buckets_command(client: Client, seed: &str) -> Result<()> {
    print_buckets(&list_buckets(client, seed).await?);
    Ok(())
}

/// Bump the reconcile annotation of a Seed
async fn reconcile_command(client: Client, name: &str) -> Result<()> {
    let api: Api<Seed> = Api::all(client);
    let timestamp = chrono::Utc::now().to_rfc3339();
    let patch = json!({
        "metadata": {
            "annotations": {
                RECONCILE_ANNOTATION: &timestamp
            }
        }
    });

    api.patch(name, &PatchParams::default(), &Patch::Merge(patch))
        .await
        .with_context(|| format!("Failed to trigger reconciliation for Seed '{name}'"))?;

    println!("Reconciliation triggered for Seed '{name}' at {timestamp}");
    Ok(())
}

async fn list_buckets(client: Client, seed: &str) -> Result<Vec<BackupBucket>> {
    let api: Api<BackupBucket> = Api::all(client);
    let mut buckets: Vec<BackupBucket> = api
        .list(&ListParams::default())
        .await
        .context("Failed to list BackupBuckets")?
        .items
        .into_iter()
        .filter(|bucket| bucket.seed_name() == Some(seed))
        .collect();
    buckets.sort_by_key(ResourceExt::name_any);
    Ok(buckets)
}

fn print_buckets(buckets: &[BackupBucket]) {
    if buckets.is_empty() {
        println!("No BackupBuckets found.");
        return;
    }

    println!("{:<30} {:<10} {:<50}", "BACKUPBUCKET", "HEALTHY", "LAST ERROR");
    println!("{}", "-".repeat(92));
    for bucket in buckets {
        let (healthy, error) = match bucket.last_error() {
            Some(e) => ("False", e.description.as_str()),
            None => ("True", "-"),
        };
        println!("{:<30} {:<10} {:<50}", bucket.name_any(), healthy, error);
    }
}
