//! # Application Status
//!
//! Status types for tracking reconciliation state and conditions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Status of the Application resource
#[derive(Debug, Clone, Deserialize, Serialize, Default, schemars::JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatus {
    /// Current phase of reconciliation
    /// Values: Pending, Ready, Degraded, Failed
    #[serde(default)]
    pub phase: Option<String>,
    /// Human-readable description of current state
    #[serde(default)]
    pub description: Option<String>,
    /// Conditions represent the latest available observations
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Observed generation
    #[serde(default)]
    pub observed_generation: Option<i64>,
    /// Last reconciliation time (RFC3339)
    #[serde(default)]
    pub last_reconcile_time: Option<String>,
    /// Outcome of the last pass per descriptor
    #[serde(default)]
    pub secrets: BTreeMap<String, SecretStatus>,
}

/// Outcome of resolving one descriptor
#[derive(Debug, Clone, Copy, Deserialize, Serialize, schemars::JsonSchema, PartialEq, Eq)]
pub enum SecretPhase {
    /// Resolved and projected
    Resolved,
    /// Required but absent
    Missing,
    /// Optional and absent
    Skipped,
    /// Generation failed
    Errored,
}

impl SecretPhase {
    /// Lowercase name, used as a metric label
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretPhase::Resolved => "resolved",
            SecretPhase::Missing => "missing",
            SecretPhase::Skipped => "skipped",
            SecretPhase::Errored => "errored",
        }
    }
}

/// Per-descriptor status entry
#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretStatus {
    /// Outcome of the last pass
    pub outcome: SecretPhase,
    /// Storage secret the projection was copied from
    #[serde(default)]
    pub source_name: Option<String>,
    /// Error cause for errored descriptors
    #[serde(default)]
    pub message: Option<String>,
}

/// Condition represents a condition of a resource
#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: String,
    /// Last transition time
    #[serde(default)]
    pub last_transition_time: Option<String>,
    /// Reason for the condition
    #[serde(default)]
    pub reason: Option<String>,
    /// Message describing the condition
    #[serde(default)]
    pub message: Option<String>,
}
