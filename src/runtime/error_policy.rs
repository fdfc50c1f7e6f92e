//! # Error Policy
//!
//! Error handling and backoff logic for the controller watch loop.
//! Failed reconciliations are retried with a per-Application Fibonacci
//! backoff; watch stream errors are classified for logging.

use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::Application;
use crate::observability;
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Handle reconciliation errors with Fibonacci backoff
///
/// Backoff state is tracked per Application so that one failing resource
/// does not slow down the others.
pub fn handle_reconciliation_error(
    obj: Arc<Application>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let name = obj.metadata.name.as_deref().unwrap_or("unknown");
    let namespace = obj.metadata.namespace.as_deref().unwrap_or("unknown");

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = name,
        resource.namespace = namespace,
        error = %error
    );
    let _error_guard = error_span.enter();

    error!("Reconciliation error for {}/{}: {:?}", namespace, name, error);
    observability::metrics::increment_reconciliation_errors();

    let resource_key = format!("{namespace}/{name}");
    let (backoff_seconds, error_count) = ctx.next_error_backoff(&resource_key);

    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::seconds(i64::try_from(backoff_seconds).unwrap_or(i64::MAX));
    info!(
        "Retrying {} in {}s at {} (error count: {})",
        resource_key,
        backoff_seconds,
        next_trigger_time.to_rfc3339(),
        error_count
    );

    observability::metrics::increment_requeues_total("error-backoff");
    Action::requeue(std::time::Duration::from_secs(backoff_seconds))
}

/// Coarse classification of a watch stream error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorKind {
    /// 401: RBAC revoked or token expired
    Unauthorized,
    /// 410: resource version too old; the watcher relists
    Expired,
    /// 429: API server storage reinitializing
    Throttled,
    /// 404: CRD missing or object deleted
    NotFound,
    Other,
}

/// Classify a watch stream error from its rendered form
///
/// 404 is checked before 401 since a plain-text 404 body surfaces as a
/// decode error mentioning the failed watch.
pub fn classify_watch_error(error_string: &str) -> WatchErrorKind {
    let is_not_found = error_string.contains("ObjectNotFound")
        || error_string.contains("404")
        || error_string.contains("not found");
    if is_not_found {
        WatchErrorKind::NotFound
    } else if error_string.contains("401") || error_string.contains("Unauthorized") {
        WatchErrorKind::Unauthorized
    } else if error_string.contains("410")
        || error_string.contains("too old resource version")
        || error_string.contains("Gone")
    {
        WatchErrorKind::Expired
    } else if error_string.contains("429")
        || error_string.contains("storage is (re)initializing")
        || error_string.contains("TooManyRequests")
    {
        WatchErrorKind::Throttled
    } else {
        WatchErrorKind::Other
    }
}

/// Log a watch stream error at a level matching its kind
pub fn log_watch_error(error_string: &str) {
    match classify_watch_error(error_string) {
        WatchErrorKind::Unauthorized => {
            error!("Watch authentication failed (401 Unauthorized) - RBAC may have been revoked or token expired: {}", error_string);
            error!("Verify the controller's ServiceAccount can list applications and secrets cluster-wide");
        }
        WatchErrorKind::Expired => {
            warn!("Watch resource version expired (410), relisting");
        }
        WatchErrorKind::Throttled => {
            warn!("API server throttling watch (429): {}", error_string);
        }
        WatchErrorKind::NotFound => {
            warn!(
                "Watched resource not found (404) - is the Application CRD installed? Error: {}",
                error_string
            );
        }
        WatchErrorKind::Other => {
            error!("Controller stream error: {}", error_string);
        }
    }
}
