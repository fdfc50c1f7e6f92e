//! # Initialization
//!
//! Controller initialization: rustls setup, tracing, metrics, probe server
//! and Kubernetes client.

use crate::config::ControllerConfig;
use crate::controller::reconciler::Reconciler;
use crate::controller::server::{start_server, ServerState};
use crate::crd::Application;
use crate::crypto::RcgenCrypto;
use crate::observability;
use crate::store::KubeStore;
use anyhow::{Context, Result};
use kube::{api::Api, api::ListParams, Client};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Everything the watch loop needs
pub struct InitializationResult {
    pub client: Client,
    /// Applications in all namespaces
    pub applications: Api<Application>,
    pub reconciler: Arc<Reconciler>,
    pub server_state: Arc<ServerState>,
    pub server_handle: JoinHandle<()>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
pub async fn initialize(config: ControllerConfig) -> Result<InitializationResult> {
    observability::init_logging(&config)?;

    // rustls 0.23 needs a process-wide provider before the first TLS connection
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider was already installed");
    }

    info!("Starting App Secrets Controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    if config.enable_metrics {
        observability::metrics::register_metrics()?;
    } else {
        info!("Metrics collection disabled");
    }

    let server_state = Arc::new(ServerState::new());
    let server_handle = start_server(config.metrics_port, server_state.clone()).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let applications: Api<Application> = Api::all(client.clone());

    let store = Arc::new(KubeStore::new(client.clone(), config.field_manager.clone()));
    let reconciler = Arc::new(Reconciler::new(store, Arc::new(RcgenCrypto), config));

    summarize_existing_applications(&applications).await;

    info!("Controller initialized, starting watch loop...");
    Ok(InitializationResult {
        client,
        applications,
        reconciler,
        server_state,
        server_handle,
    })
}

/// Log the Applications present at startup, grouped by namespace
///
/// A failed list is logged and tolerated; the watch keeps retrying.
async fn summarize_existing_applications(applications: &Api<Application>) {
    match applications.list(&ListParams::default()).await {
        Ok(list) => {
            let mut by_namespace: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for item in &list.items {
                by_namespace
                    .entry(item.metadata.namespace.clone().unwrap_or_default())
                    .or_default()
                    .push(item.metadata.name.clone().unwrap_or_default());
            }
            info!(
                "Found {} existing Applications in {} namespaces",
                list.items.len(),
                by_namespace.len()
            );
            for (namespace, mut names) in by_namespace {
                names.sort();
                info!("  {}: {}", namespace, names.join(", "));
            }
        }
        Err(e) => {
            error!("Application CRD is not queryable: {}. Is the CRD installed?", e);
            error!("Installation: app-secrets-controller crd | kubectl apply -f -");
            warn!("Continuing despite CRD queryability check failure - controller will retry");
        }
    }
}
