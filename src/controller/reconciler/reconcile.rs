//! # Reconcile
//!
//! One pass over an Application: validate, resolve every secret, emit the
//! projections and record the outcome in the status.

use crate::controller::reconciler::status::{completed_status, failed_status, update_status};
use crate::controller::reconciler::types::{Reconciler, ReconcilerError};
use crate::controller::reconciler::validation::validate_application;
use crate::crd::Application;
use crate::observability::metrics;
use crate::secrets::{emit_projections, reconcile_secrets, AppIdentity, ResolveError};
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn, Instrument};

/// Reconcile an Application
///
/// Missing or errored secrets are not failures: the status records them and
/// the Application is requeued after the pending interval. Validation errors
/// and fatal resolution errors are returned to the error policy.
pub async fn reconcile(
    app: Arc<Application>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let start = Instant::now();
    metrics::increment_reconciliations();

    let name = app.metadata.name.as_deref().unwrap_or("unknown").to_string();
    let namespace = app
        .metadata
        .namespace
        .as_deref()
        .unwrap_or("unknown")
        .to_string();
    let span = tracing::span!(
        tracing::Level::INFO,
        "controller.reconcile",
        resource.name = name.as_str(),
        resource.namespace = namespace.as_str(),
        resource.kind = "Application"
    );

    if app.metadata.deletion_timestamp.is_some() {
        debug!("Application {}/{} is being deleted, skipping", namespace, name);
        return Ok(Action::await_change());
    }

    let result = run_pass(&app, &ctx).instrument(span).await;
    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

    let resource_key = format!("{namespace}/{name}");
    match &result {
        Ok(_) => ctx.reset_backoff(&resource_key),
        Err(e) => error!("Reconciliation of {} failed: {}", resource_key, e),
    }
    result
}

async fn run_pass(app: &Application, ctx: &Reconciler) -> Result<Action, ReconcilerError> {
    let store = ctx.store.as_ref();
    let now = chrono::Utc::now().to_rfc3339();

    if let Err(e) = validate_application(app, ctx.config.max_secrets_per_application) {
        let message = e.to_string();
        warn!("Validation failed: {}", message);
        record_failure(ctx, app, "ValidationFailed", &message, &now).await?;
        return Err(ReconcilerError::Validation(message));
    }

    let report = match resolve_and_project(app, ctx).await {
        Ok(report) => report,
        Err(e) => {
            record_failure(ctx, app, "SecretResolutionFailed", &e.to_string(), &now).await?;
            return Err(ReconcilerError::Secrets(e));
        }
    };

    let status = completed_status(app, &report, &now);
    update_status(store, app, &status)
        .await
        .map_err(ReconcilerError::Status)?;

    if report.condition.is_success() {
        info!(
            "Projected {} secrets, next pass in {}s",
            report.projections.len(),
            ctx.config.reconcile_interval_secs
        );
        metrics::increment_requeues_total("periodic");
        Ok(Action::requeue(ctx.config.reconcile_interval()))
    } else {
        info!(
            "Secrets pending ({}), retrying in {}s",
            report.condition.message().unwrap_or_default(),
            ctx.config.pending_requeue_secs
        );
        metrics::increment_requeues_total("pending-secrets");
        Ok(Action::requeue(ctx.config.pending_requeue()))
    }
}

/// Resolve every secret and emit the projections
///
/// Nothing is projected when resolution aborts.
async fn resolve_and_project(
    app: &Application,
    ctx: &Reconciler,
) -> Result<crate::secrets::SecretsReport, ResolveError> {
    let identity = AppIdentity::from_application(app)?;
    let report = reconcile_secrets(ctx.store.as_ref(), Arc::clone(&ctx.crypto), app).await?;
    let summary = emit_projections(ctx.store.as_ref(), &identity, &report.projections).await?;
    if !summary.pruned.is_empty() {
        info!("Pruned stale projections: {}", summary.pruned.join(", "));
    }
    Ok(report)
}

async fn record_failure(
    ctx: &Reconciler,
    app: &Application,
    reason: &str,
    message: &str,
    now: &str,
) -> Result<(), ReconcilerError> {
    let status = failed_status(app, reason, message, now);
    update_status(ctx.store.as_ref(), app, &status)
        .await
        .map_err(ReconcilerError::Status)?;
    Ok(())
}
