//! # Watch Loop
//!
//! Runs the Kubernetes controller over Application resources and the
//! projected Secrets they own.

use crate::constants::{LABEL_MANAGED, WATCH_RESTART_DELAY_SECS};
use crate::controller::reconciler::reconcile;
use crate::runtime::error_policy::{handle_reconciliation_error, log_watch_error};
use crate::runtime::initialization::InitializationResult;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::api::Api;
use kube_runtime::{watcher, Controller};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Run the controller watch loop until a shutdown signal arrives
///
/// The controller is restarted if its stream ends for any other reason.
pub async fn run_watch_loop(init: InitializationResult) -> anyhow::Result<()> {
    let InitializationResult {
        client,
        applications,
        reconciler,
        server_state,
        server_handle,
    } = init;

    let shutdown_state = server_state.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Received shutdown signal, initiating graceful shutdown...");
        shutdown_state.mark_not_ready();
    });

    let managed_selector = format!("{LABEL_MANAGED}=true");
    server_state.mark_ready();

    loop {
        info!("Starting controller watch loop...");
        let secrets: Api<Secret> = Api::all(client.clone());
        Controller::new(applications.clone(), watcher::Config::default().any_semantic())
            .owns(secrets, watcher::Config::default().labels(&managed_selector))
            .shutdown_on_signal()
            .run(reconcile, handle_reconciliation_error, reconciler.clone())
            .for_each(|result| async move {
                match result {
                    Ok((object, action)) => {
                        debug!("Reconciled {}: {:?}", object, action);
                    }
                    Err(e) => log_watch_error(&format!("{e:?}")),
                }
            })
            .await;

        if !server_state.is_ready() {
            break;
        }
        // The signal handler may still be marking shutdown
        tokio::time::sleep(Duration::from_secs(WATCH_RESTART_DELAY_SECS)).await;
        if !server_state.is_ready() {
            break;
        }
        warn!("Controller watch stream ended, restarting");
    }

    server_handle.abort();
    info!("Controller stopped gracefully");
    Ok(())
}
