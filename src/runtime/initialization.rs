//! # Initialization
//!
//! Controller initialization logic including rustls setup, tracing, metrics,
//! server startup, configuration and Kubernetes client setup.

use crate::config::{self, ControllerConfig, ServerConfig};
use crate::controller::server::{start_server, ServerState};
use crate::crd::{BackupBucket, Seed};
use crate::observability;
use anyhow::{Context, Result};
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Initialization result containing all necessary components for the controller
#[allow(
    missing_debug_implementations,
    reason = "kube::Client does not implement Debug"
)]
pub struct InitializationResult {
    /// Kubernetes client
    pub client: Client,
    /// Validated controller configuration
    pub controller_config: ControllerConfig,
    /// Server state for health checks, marked ready by the watch loop
    pub server_state: Arc<ServerState>,
}

/// Initialize the controller runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Configuration loading and validation
/// - Metrics registration
/// - HTTP server startup
/// - Kubernetes client creation
///
/// # Errors
///
/// Fails on invalid configuration, metric registration errors, an HTTP server
/// that does not come up, or when no Kubernetes client can be created.
pub async fn initialize() -> Result<InitializationResult> {
    // Required for rustls 0.23+ when no default provider is set via features
    let provider_installed = rustls::crypto::ring::default_provider()
        .install_default()
        .is_ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backupbuckets_check_controller=info".into()),
        )
        .init();

    if !provider_installed {
        debug!("rustls crypto provider was already installed");
    }

    info!("Starting BackupBuckets Check Controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    let (controller_config, server_config) = config::load_config();
    controller_config
        .validate()
        .context("Invalid controller configuration")?;
    log_config(&controller_config);

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());

    // Start server in background task and wait for it to bind before proceeding
    let server_handle = {
        let server_state = Arc::clone(&server_state);
        let port = server_config.metrics_port;
        tokio::spawn(async move {
            if let Err(e) = start_server(port, server_state).await {
                error!("HTTP server error: {}", e);
            }
        })
    };
    wait_for_server_ready(&server_state, &server_handle, &server_config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    check_crds_queryable(&client).await;

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        controller_config,
        server_state,
    })
}

fn log_config(config: &ControllerConfig) {
    info!(
        condition_type = %config.condition.condition_type,
        threshold = ?config.condition_threshold,
        sync_period = ?config.sync_period,
        min_requeue_interval = ?config.min_requeue_interval,
        concurrent_syncs = config.concurrent_syncs,
        "Controller configuration loaded"
    );
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    server_config: &ServerConfig,
) -> Result<()> {
    let startup_timeout = std::time::Duration::from_secs(server_config.startup_timeout_secs);
    let poll_interval = std::time::Duration::from_millis(server_config.poll_interval_ms);
    let start_time = std::time::Instant::now();

    loop {
        // Check if server task crashed
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state
            .is_ready
            .load(std::sync::atomic::Ordering::Relaxed)
        {
            info!("HTTP server is ready and accepting connections");
            break;
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }

    Ok(())
}

/// Check that both CRDs are served and summarize what exists
///
/// Failures are logged only; the watchers keep retrying once the CRDs appear.
async fn check_crds_queryable(client: &Client) {
    let startup_span = tracing::span!(
        tracing::Level::INFO,
        "controller.startup.check_crds",
        operation = "check_crds_queryable"
    );
    let _guard = startup_span.enter();

    let seeds: Api<Seed> = Api::all(client.clone());
    match seeds.list(&ListParams::default()).await {
        Ok(list) => {
            let mut names: Vec<String> = list.items.iter().map(ResourceExt::name_any).collect();
            names.sort();
            info!(
                "Seed CRD is queryable, found {} Seeds: {}",
                names.len(),
                summarize(&names)
            );
        }
        Err(e) => {
            error!("Seed CRD is not queryable; {:?}. Is the CRD installed?", e);
            warn!("Continuing despite CRD queryability check failure - the watch will retry");
        }
    }

    let backup_buckets: Api<BackupBucket> = Api::all(client.clone());
    match backup_buckets.list(&ListParams::default()).await {
        Ok(list) => {
            let orphaned = list
                .items
                .iter()
                .filter(|bucket| bucket.seed_name().is_none())
                .count();
            info!(
                "BackupBucket CRD is queryable, found {} BackupBuckets ({} without a Seed)",
                list.items.len(),
                orphaned
            );
        }
        Err(e) => {
            error!("BackupBucket CRD is not queryable; {:?}. Is the CRD installed?", e);
            warn!("Continuing despite CRD queryability check failure - the watch will retry");
        }
    }
}

fn summarize(names: &[String]) -> String {
    if names.len() <= 3 {
        names.join(", ")
    } else {
        format!("{}, ... ({} total)", names[..3].join(", "), names.len())
    }
}
