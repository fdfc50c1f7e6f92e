//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default requeue interval after a clean reconciliation (seconds)
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 300;

/// Default requeue interval when some secrets are missing or errored (seconds)
/// Jobs that have not finished yet are picked up on the next pass
pub const DEFAULT_PENDING_REQUEUE_SECS: u64 = 30;

/// Default Fibonacci backoff floor for reconciliation errors (minutes)
pub const DEFAULT_BACKOFF_MIN_MINUTES: u64 = 1;

/// Default Fibonacci backoff ceiling for reconciliation errors (minutes)
pub const DEFAULT_BACKOFF_MAX_MINUTES: u64 = 10;

/// Maximum number of secret descriptors a single Application may declare
pub const DEFAULT_MAX_SECRETS_PER_APPLICATION: usize = 256;

/// Field manager used for server-side apply and status patches
pub const DEFAULT_FIELD_MANAGER: &str = "app-secrets-controller";

/// Label: name of the owning Application
pub const LABEL_APP_NAME: &str = "apps.octopilot.io/app-name";

/// Label: namespace of the owning Application
pub const LABEL_APP_NAMESPACE: &str = "apps.octopilot.io/app-namespace";

/// Label: marks objects managed by this controller
pub const LABEL_MANAGED: &str = "apps.octopilot.io/managed";

/// Label: UID of the owning Application (storage secrets only)
pub const LABEL_APP_UID: &str = "apps.octopilot.io/app-uid";

/// Label: descriptor name a storage secret was generated for
pub const LABEL_SECRET_NAME: &str = "apps.octopilot.io/secret-name";

/// Label: marks a projection (consumer-facing copy)
pub const LABEL_PROJECTION: &str = "apps.octopilot.io/projection";

/// Annotation: storage secret a projection was copied from
/// An annotation because bound secret names may exceed the label value limit
pub const ANNOTATION_SECRET_SOURCE_NAME: &str = "apps.octopilot.io/secret-source-name";

/// Annotation: Application generation that produced a projection
pub const ANNOTATION_APP_GENERATION: &str = "apps.octopilot.io/app-generation";

/// Condition type carrying the aggregate secret resolution result
pub const CONDITION_SECRETS: &str = "Secrets";

/// Condition type carrying overall readiness
pub const CONDITION_READY: &str = "Ready";

/// Delay before restarting a controller stream that ended without a shutdown signal (seconds)
pub const WATCH_RESTART_DELAY_SECS: u64 = 5;
