//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `app_secrets_reconciliations_total` - Total number of reconciliations
//! - `app_secrets_reconciliation_errors_total` - Total number of reconciliation errors
//! - `app_secrets_reconciliation_duration_seconds` - Duration of reconciliation operations
//! - `app_secrets_secret_outcomes_total{outcome}` - Descriptor outcomes (resolved, missing, skipped, errored)
//! - `app_secrets_generated_secrets_total{type}` - Storage secrets generated, by secret type
//! - `app_secrets_projections_applied_total` - Projections applied
//! - `app_secrets_projections_pruned_total` - Stale projections deleted
//! - `app_secrets_job_output_results_total{result}` - Job output extraction results
//! - `app_secrets_requeues_total{reason}` - Requeues scheduled, by reason

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "app_secrets_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "app_secrets_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "app_secrets_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static SECRET_OUTCOMES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "app_secrets_secret_outcomes_total",
            "Total number of secret descriptor outcomes by outcome",
        ),
        &["outcome"],
    )
    .expect("Failed to create SECRET_OUTCOMES_TOTAL metric - this should never happen")
});

static GENERATED_SECRETS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "app_secrets_generated_secrets_total",
            "Total number of storage secrets generated by secret type",
        ),
        &["type"],
    )
    .expect("Failed to create GENERATED_SECRETS_TOTAL metric - this should never happen")
});

static PROJECTIONS_APPLIED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "app_secrets_projections_applied_total",
        "Total number of projected secrets applied",
    )
    .expect("Failed to create PROJECTIONS_APPLIED_TOTAL metric - this should never happen")
});

static PROJECTIONS_PRUNED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "app_secrets_projections_pruned_total",
        "Total number of stale projected secrets deleted",
    )
    .expect("Failed to create PROJECTIONS_PRUNED_TOTAL metric - this should never happen")
});

static JOB_OUTPUT_RESULTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "app_secrets_job_output_results_total",
            "Total number of job output extractions by result",
        ),
        &["result"],
    )
    .expect("Failed to create JOB_OUTPUT_RESULTS_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "app_secrets_requeues_total",
            "Total number of requeues scheduled by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
/// Register every metric with the registry served on `/metrics`
///
/// Fails if called twice.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(SECRET_OUTCOMES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(GENERATED_SECRETS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PROJECTIONS_APPLIED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PROJECTIONS_PRUNED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(JOB_OUTPUT_RESULTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_secret_outcomes(outcome: &str) {
    SECRET_OUTCOMES_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn increment_generated_secrets(secret_type: &str) {
    GENERATED_SECRETS_TOTAL
        .with_label_values(&[secret_type])
        .inc();
}

pub fn increment_projections_applied(count: usize) {
    PROJECTIONS_APPLIED_TOTAL.inc_by(u64::try_from(count).unwrap_or(u64::MAX));
}

pub fn increment_projections_pruned(count: usize) {
    PROJECTIONS_PRUNED_TOTAL.inc_by(u64::try_from(count).unwrap_or(u64::MAX));
}

pub fn increment_job_output_results(result: &str) {
    JOB_OUTPUT_RESULTS_TOTAL.with_label_values(&[result]).inc();
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_reconciliations() {
        let before = RECONCILIATIONS_TOTAL.get();
        increment_reconciliations();
        let after = RECONCILIATIONS_TOTAL.get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_increment_reconciliation_errors() {
        let before = RECONCILIATION_ERRORS_TOTAL.get();
        increment_reconciliation_errors();
        let after = RECONCILIATION_ERRORS_TOTAL.get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_observe_reconciliation_duration() {
        let before = RECONCILIATION_DURATION.get_sample_count();
        observe_reconciliation_duration(0.4);
        assert_eq!(RECONCILIATION_DURATION.get_sample_count(), before + 1);
    }

    #[test]
    fn test_increment_secret_outcomes() {
        let before = SECRET_OUTCOMES_TOTAL.with_label_values(&["skipped"]).get();
        increment_secret_outcomes("skipped");
        let after = SECRET_OUTCOMES_TOTAL.with_label_values(&["skipped"]).get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_increment_projections_by_count() {
        let before = PROJECTIONS_PRUNED_TOTAL.get();
        increment_projections_pruned(3);
        assert!(PROJECTIONS_PRUNED_TOTAL.get() >= before + 3);
    }

    #[test]
    fn test_increment_requeues_total() {
        let before = REQUEUES_TOTAL.with_label_values(&["error-backoff"]).get();
        increment_requeues_total("error-backoff");
        let after = REQUEUES_TOTAL.with_label_values(&["error-backoff"]).get();
        assert_eq!(after, before + 1u64);
    }
}
