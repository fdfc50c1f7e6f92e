//! # Status Updates
//!
//! Builds the Application status from the outcome of a pass and writes it
//! only when it actually changed, so that status writes do not retrigger
//! reconciliation.

use crate::constants::{CONDITION_READY, CONDITION_SECRETS};
use crate::crd::{Application, ApplicationStatus, Condition};
use crate::secrets::{SecretsCondition, SecretsReport};
use crate::store::{ObjectStore, StoreError};
use tracing::debug;

pub const PHASE_READY: &str = "Ready";
pub const PHASE_DEGRADED: &str = "Degraded";
pub const PHASE_FAILED: &str = "Failed";

fn condition_status(ok: bool) -> &'static str {
    if ok {
        "True"
    } else {
        "False"
    }
}

/// Keep the previous transition time while a condition's status is unchanged
fn transition_time(
    previous: Option<&ApplicationStatus>,
    condition_type: &str,
    status: &str,
    now: &str,
) -> String {
    previous
        .and_then(|s| s.conditions.iter().find(|c| c.r#type == condition_type))
        .filter(|c| c.status == status)
        .and_then(|c| c.last_transition_time.clone())
        .unwrap_or_else(|| now.to_string())
}

fn condition(
    previous: Option<&ApplicationStatus>,
    condition_type: &str,
    ok: bool,
    reason: &str,
    message: Option<String>,
    now: &str,
) -> Condition {
    let status = condition_status(ok);
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        last_transition_time: Some(transition_time(previous, condition_type, status, now)),
        reason: Some(reason.to_string()),
        message,
    }
}

/// Status after a pass that ran to completion
pub fn completed_status(app: &Application, report: &SecretsReport, now: &str) -> ApplicationStatus {
    let previous = app.status.as_ref();
    let resolved = report.projections.len();
    let declared = app.spec.secrets.len();

    let (phase, description, secrets_condition) = match &report.condition {
        SecretsCondition::Success => {
            let description = format!("Resolved {resolved} of {declared} secrets");
            (
                PHASE_READY,
                description.clone(),
                condition(
                    previous,
                    CONDITION_SECRETS,
                    true,
                    "SecretsResolved",
                    Some(description),
                    now,
                ),
            )
        }
        SecretsCondition::Error(message) => (
            PHASE_DEGRADED,
            message.clone(),
            condition(
                previous,
                CONDITION_SECRETS,
                false,
                "SecretsUnresolved",
                Some(message.clone()),
                now,
            ),
        ),
    };
    let ready = report.condition.is_success();

    ApplicationStatus {
        phase: Some(phase.to_string()),
        description: Some(description.clone()),
        conditions: vec![
            secrets_condition,
            condition(
                previous,
                CONDITION_READY,
                ready,
                if ready {
                    "ReconciliationSucceeded"
                } else {
                    "SecretsPending"
                },
                Some(description),
                now,
            ),
        ],
        observed_generation: app.metadata.generation,
        last_reconcile_time: Some(now.to_string()),
        secrets: report
            .outcomes
            .iter()
            .map(|(name, outcome)| (name.clone(), outcome.to_status()))
            .collect(),
    }
}

/// Status after validation failed or the pass was aborted
///
/// Per-secret entries from the last completed pass are kept.
pub fn failed_status(app: &Application, reason: &str, message: &str, now: &str) -> ApplicationStatus {
    let previous = app.status.as_ref();
    ApplicationStatus {
        phase: Some(PHASE_FAILED.to_string()),
        description: Some(message.to_string()),
        conditions: vec![
            condition(
                previous,
                CONDITION_SECRETS,
                false,
                reason,
                Some(message.to_string()),
                now,
            ),
            condition(
                previous,
                CONDITION_READY,
                false,
                "ReconciliationFailed",
                Some(message.to_string()),
                now,
            ),
        ],
        observed_generation: app.metadata.generation,
        last_reconcile_time: Some(now.to_string()),
        secrets: previous.map(|s| s.secrets.clone()).unwrap_or_default(),
    }
}

/// Whether `next` differs from `previous` in anything but the reconcile time
pub fn status_changed(previous: Option<&ApplicationStatus>, next: &ApplicationStatus) -> bool {
    let Some(previous) = previous else {
        return true;
    };
    let mut previous = previous.clone();
    let mut next = next.clone();
    previous.last_reconcile_time = None;
    next.last_reconcile_time = None;
    previous != next
}

/// Write `status` unless it matches what the Application already reports
///
/// Returns whether a write happened.
pub async fn update_status(
    store: &dyn ObjectStore,
    app: &Application,
    status: &ApplicationStatus,
) -> Result<bool, StoreError> {
    let name = app.metadata.name.as_deref().unwrap_or_default();
    let namespace = app.metadata.namespace.as_deref().unwrap_or_default();

    if !status_changed(app.status.as_ref(), status) {
        debug!(
            "Skipping status update for {}/{} - status unchanged",
            namespace, name
        );
        return Ok(false);
    }

    store
        .patch_application_status(namespace, name, status)
        .await?;
    debug!(
        "Updated status of {}/{}: phase={:?}",
        namespace, name, status.phase
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{ApplicationSpec, SecretDescriptor, SecretPhase, SecretType};
    use crate::secrets::SecretOutcome;
    use std::collections::BTreeMap;

    const T0: &str = "2026-01-01T00:00:00+00:00";
    const T1: &str = "2026-01-01T00:05:00+00:00";

    fn app() -> Application {
        let mut spec = ApplicationSpec::default();
        spec.secrets
            .insert("db".to_string(), SecretDescriptor::of_type(SecretType::Basic));
        spec.secrets
            .insert("api".to_string(), SecretDescriptor::of_type(SecretType::Opaque));
        let mut app = Application::new("storefront", spec);
        app.metadata.namespace = Some("team-a".to_string());
        app.metadata.generation = Some(3);
        app
    }

    fn report(condition: SecretsCondition) -> SecretsReport {
        SecretsReport {
            condition,
            projections: Vec::new(),
            outcomes: BTreeMap::from([
                (
                    "db".to_string(),
                    SecretOutcome::Resolved {
                        source_name: "db-x7k2p".to_string(),
                    },
                ),
                ("api".to_string(), SecretOutcome::Missing),
            ]),
        }
    }

    fn find<'a>(status: &'a ApplicationStatus, condition_type: &str) -> &'a Condition {
        status
            .conditions
            .iter()
            .find(|c| c.r#type == condition_type)
            .unwrap()
    }

    #[test]
    fn test_error_condition_degrades() {
        let status = completed_status(
            &app(),
            &report(SecretsCondition::Error("missing: [api]".to_string())),
            T0,
        );
        assert_eq!(status.phase.as_deref(), Some(PHASE_DEGRADED));
        let secrets = find(&status, CONDITION_SECRETS);
        assert_eq!(secrets.status, "False");
        assert_eq!(secrets.message.as_deref(), Some("missing: [api]"));
        assert_eq!(find(&status, CONDITION_READY).status, "False");
        assert_eq!(status.observed_generation, Some(3));
        assert_eq!(status.secrets["api"].outcome, SecretPhase::Missing);
        assert_eq!(status.secrets["db"].source_name.as_deref(), Some("db-x7k2p"));
    }

    #[test]
    fn test_success_condition_is_ready() {
        let status = completed_status(&app(), &report(SecretsCondition::Success), T0);
        assert_eq!(status.phase.as_deref(), Some(PHASE_READY));
        assert_eq!(find(&status, CONDITION_SECRETS).status, "True");
        assert_eq!(find(&status, CONDITION_READY).status, "True");
    }

    #[test]
    fn test_failed_status_keeps_previous_secrets() {
        let mut app = app();
        app.status = Some(completed_status(&app, &report(SecretsCondition::Success), T0));

        let status = failed_status(&app, "SecretResolutionFailed", "list secrets rejected", T1);
        assert_eq!(status.phase.as_deref(), Some(PHASE_FAILED));
        let secrets = find(&status, CONDITION_SECRETS);
        assert_eq!(secrets.reason.as_deref(), Some("SecretResolutionFailed"));
        assert_eq!(secrets.last_transition_time.as_deref(), Some(T1));
        assert_eq!(status.secrets.len(), 2);
    }

    #[test]
    fn test_transition_time_is_kept_while_status_unchanged() {
        let mut app = app();
        let first = completed_status(&app, &report(SecretsCondition::Success), T0);
        app.status = Some(first.clone());

        let second = completed_status(&app, &report(SecretsCondition::Success), T1);
        assert_eq!(
            find(&second, CONDITION_READY).last_transition_time.as_deref(),
            Some(T0)
        );
        assert_eq!(second.last_reconcile_time.as_deref(), Some(T1));
        assert!(!status_changed(Some(&first), &second));
    }

    #[test]
    fn test_status_change_detection() {
        let app = app();
        let ready = completed_status(&app, &report(SecretsCondition::Success), T0);
        let degraded = completed_status(
            &app,
            &report(SecretsCondition::Error("missing: [api]".to_string())),
            T0,
        );
        assert!(status_changed(None, &ready));
        assert!(status_changed(Some(&ready), &degraded));
        assert!(!status_changed(Some(&ready), &ready));
    }
}
