//! # Ordering & Aggregation
//!
//! Runs the resolver over every descriptor of an application in a fixed
//! order and reduces the per-descriptor outcomes to one condition.

use crate::crd::{Application, ApplicationSpec, SecretDescriptor, SecretPhase, SecretStatus, SecretType};
use crate::crypto::{BlockingCrypto, CryptoProvider};
use crate::observability::metrics;
use crate::secrets::{AppIdentity, ErrorClass, Projection, ResolveError, Resolver};
use crate::store::ObjectStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of one descriptor in a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretOutcome {
    Resolved { source_name: String },
    /// Required and absent
    Missing,
    /// Optional and absent
    Skipped,
    /// Generation failed; holds the cause
    Errored(String),
}

impl SecretOutcome {
    pub fn phase(&self) -> SecretPhase {
        match self {
            SecretOutcome::Resolved { .. } => SecretPhase::Resolved,
            SecretOutcome::Missing => SecretPhase::Missing,
            SecretOutcome::Skipped => SecretPhase::Skipped,
            SecretOutcome::Errored(_) => SecretPhase::Errored,
        }
    }

    pub fn to_status(&self) -> SecretStatus {
        SecretStatus {
            outcome: self.phase(),
            source_name: match self {
                SecretOutcome::Resolved { source_name } => Some(source_name.clone()),
                _ => None,
            },
            message: match self {
                SecretOutcome::Errored(cause) => Some(cause.clone()),
                _ => None,
            },
        }
    }
}

/// Aggregate result of a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretsCondition {
    Success,
    Error(String),
}

impl SecretsCondition {
    pub fn is_success(&self) -> bool {
        matches!(self, SecretsCondition::Success)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            SecretsCondition::Success => None,
            SecretsCondition::Error(message) => Some(message),
        }
    }
}

/// Everything a pass produced
#[derive(Debug, Clone)]
pub struct SecretsReport {
    pub condition: SecretsCondition,
    /// In processing order
    pub projections: Vec<Projection>,
    pub outcomes: BTreeMap<String, SecretOutcome>,
}

/// Processing order: every non-`generated` descriptor by name, then every
/// `generated` descriptor by name
pub fn ordered_descriptors(spec: &ApplicationSpec) -> Vec<(&str, &SecretDescriptor)> {
    let (generated, mut ordered): (Vec<_>, Vec<_>) = spec
        .secrets
        .iter()
        .map(|(name, descriptor)| (name.as_str(), descriptor))
        .partition(|(_, d)| d.secret_type == SecretType::Generated);
    ordered.extend(generated);
    ordered
}

/// `missing: [a, b] errored: [c: cause]`, with empty groups left out
///
/// Both lists are sorted. `None` when both are empty.
pub fn aggregate_message(missing: &[String], errored: &[String]) -> Option<String> {
    let mut groups = Vec::new();
    for (label, entries) in [("missing", missing), ("errored", errored)] {
        if entries.is_empty() {
            continue;
        }
        let mut sorted = entries.to_vec();
        sorted.sort();
        groups.push(format!("{label}: [{}]", sorted.join(", ")));
    }
    (!groups.is_empty()).then(|| groups.join(" "))
}

/// Resolve every descriptor of `app`
///
/// A fatal error aborts the pass and is returned as-is; nothing resolved so
/// far is reported.
pub async fn reconcile_secrets(
    store: &dyn ObjectStore,
    crypto: Arc<dyn CryptoProvider>,
    app: &Application,
) -> Result<SecretsReport, ResolveError> {
    let identity = AppIdentity::from_application(app)?;
    let crypto = BlockingCrypto::new(crypto);
    let mut resolver = Resolver::new(store, crypto, &identity, &app.spec);

    let mut missing = Vec::new();
    let mut errored = Vec::new();
    let mut projections = Vec::new();
    let mut outcomes = BTreeMap::new();

    for (name, descriptor) in ordered_descriptors(&app.spec) {
        let outcome = match resolver.resolve(name).await {
            Ok(resolved) => {
                let source_name = resolved.source_name.clone();
                projections.push(Projection::new(&identity, name, &resolved));
                SecretOutcome::Resolved { source_name }
            }
            Err(err) => match err.classify() {
                ErrorClass::Absent if descriptor.optional => {
                    debug!("Optional secret {} not found, skipping", name);
                    SecretOutcome::Skipped
                }
                ErrorClass::Absent => {
                    warn!("Secret {} is missing: {}", name, err);
                    missing.push(name.to_string());
                    SecretOutcome::Missing
                }
                ErrorClass::Generator => {
                    warn!("Secret {} errored: {}", name, err);
                    errored.push(format!("{name}: {err}"));
                    SecretOutcome::Errored(err.to_string())
                }
                ErrorClass::Fatal => {
                    error!(
                        "Aborting secret resolution for {}/{} at {}: {}",
                        identity.namespace, identity.name, name, err
                    );
                    return Err(err);
                }
            },
        };
        metrics::increment_secret_outcomes(outcome.phase().as_str());
        outcomes.insert(name.to_string(), outcome);
    }

    let condition = match aggregate_message(&missing, &errored) {
        Some(message) => SecretsCondition::Error(message),
        None => SecretsCondition::Success,
    };
    info!(
        "Resolved {}/{} of {} secrets for {}/{}",
        projections.len(),
        outcomes.len(),
        app.spec.secrets.len(),
        identity.namespace,
        identity.name
    );

    Ok(SecretsReport {
        condition,
        projections,
        outcomes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_descriptors_come_last() {
        let mut spec = ApplicationSpec::default();
        for (name, secret_type) in [
            ("b-token", SecretType::Generated),
            ("z-db", SecretType::Basic),
            ("a-token", SecretType::Generated),
            ("c-tls", SecretType::Tls),
            ("d-raw", SecretType::Opaque),
        ] {
            spec.secrets
                .insert(name.to_string(), SecretDescriptor::of_type(secret_type));
        }

        let order: Vec<&str> = ordered_descriptors(&spec)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(order, vec!["c-tls", "d-raw", "z-db", "a-token", "b-token"]);
    }

    #[test]
    fn test_aggregate_message_groups() {
        assert_eq!(aggregate_message(&[], &[]), None);
        assert_eq!(
            aggregate_message(&["b".to_string(), "a".to_string()], &[]),
            Some("missing: [a, b]".to_string())
        );
        assert_eq!(
            aggregate_message(&[], &["c: job not complete".to_string()]),
            Some("errored: [c: job not complete]".to_string())
        );
        assert_eq!(
            aggregate_message(&["a".to_string()], &["b: job has no output".to_string()]),
            Some("missing: [a] errored: [b: job has no output]".to_string())
        );
    }

    #[test]
    fn test_outcome_status() {
        let status = SecretOutcome::Errored("job not complete".to_string()).to_status();
        assert_eq!(status.outcome, SecretPhase::Errored);
        assert_eq!(status.message.as_deref(), Some("job not complete"));

        let status = SecretOutcome::Resolved {
            source_name: "db-x".to_string(),
        }
        .to_status();
        assert_eq!(status.source_name.as_deref(), Some("db-x"));
    }
}
