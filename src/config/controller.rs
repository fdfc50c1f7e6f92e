//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use crate::constants::{
    DEFAULT_BACKOFF_MAX_MINUTES, DEFAULT_BACKOFF_MIN_MINUTES, DEFAULT_FIELD_MANAGER,
    DEFAULT_MAX_SECRETS_PER_APPLICATION, DEFAULT_METRICS_PORT,
    DEFAULT_PENDING_REQUEUE_SECS, DEFAULT_RECONCILE_INTERVAL_SECS,
};
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// Human-readable text
    Text,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("text") {
            LogFormat::Text
        } else {
            LogFormat::Json
        }
    }
}

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// HTTP port for `/metrics`, `/healthz` and `/readyz`
    pub metrics_port: u16,
    /// Requeue interval after a clean pass (seconds)
    pub reconcile_interval_secs: u64,
    /// Requeue interval when the Secrets condition reports missing or errored secrets (seconds)
    pub pending_requeue_secs: u64,
    /// Fibonacci backoff floor for failed reconciliations (minutes)
    pub backoff_min_minutes: u64,
    /// Fibonacci backoff ceiling for failed reconciliations (minutes)
    pub backoff_max_minutes: u64,
    /// Maximum descriptors per Application
    pub max_secrets_per_application: usize,
    /// Field manager for server-side apply
    pub field_manager: String,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    /// Used when `RUST_LOG` is not set
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: LogFormat,
    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            reconcile_interval_secs: DEFAULT_RECONCILE_INTERVAL_SECS,
            pending_requeue_secs: DEFAULT_PENDING_REQUEUE_SECS,
            backoff_min_minutes: DEFAULT_BACKOFF_MIN_MINUTES,
            backoff_max_minutes: DEFAULT_BACKOFF_MAX_MINUTES,
            max_secrets_per_application: DEFAULT_MAX_SECRETS_PER_APPLICATION,
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            log_level: "INFO".to_string(),
            log_format: LogFormat::Json,
            enable_metrics: true,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// `from_env` is this with `std::env::var`; tests pass a map instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            metrics_port: parsed_or(&lookup, "METRICS_PORT", defaults.metrics_port),
            reconcile_interval_secs: parsed_or(
                &lookup,
                "RECONCILE_INTERVAL_SECS",
                defaults.reconcile_interval_secs,
            ),
            pending_requeue_secs: parsed_or(
                &lookup,
                "PENDING_REQUEUE_SECS",
                defaults.pending_requeue_secs,
            ),
            backoff_min_minutes: parsed_or(
                &lookup,
                "BACKOFF_MIN_MINUTES",
                defaults.backoff_min_minutes,
            ),
            backoff_max_minutes: parsed_or(
                &lookup,
                "BACKOFF_MAX_MINUTES",
                defaults.backoff_max_minutes,
            ),
            max_secrets_per_application: parsed_or(
                &lookup,
                "MAX_SECRETS_PER_APPLICATION",
                defaults.max_secrets_per_application,
            ),
            field_manager: lookup("FIELD_MANAGER").unwrap_or(defaults.field_manager),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map_or(defaults.log_format, |v| LogFormat::parse(&v)),
            enable_metrics: lookup("ENABLE_METRICS")
                .map_or(defaults.enable_metrics, |v| parse_bool(&v)),
        }
    }

    /// Get requeue duration after a clean pass
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }

    /// Get requeue duration while secrets are still missing or errored
    pub fn pending_requeue(&self) -> Duration {
        Duration::from_secs(self.pending_requeue_secs)
    }
}

/// Read a key and parse it, falling back to `default` when unset or malformed
fn parsed_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_bool(value: &str) -> bool {
    let v_lower = value.to_lowercase();
    v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
}
