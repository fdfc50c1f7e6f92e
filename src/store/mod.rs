//! # Object Store
//!
//! The cluster object store as seen by the secrets engine.
//!
//! - `kubernetes.rs` - `KubeStore`, backed by the Kubernetes API
//! - `memory.rs` - `MemoryStore`, an in-process store used by tests and dry runs
//!
//! Every operation distinguishes absence (`StoreError::NotFound`) from any
//! other fault so the engine can classify outcomes. Application status is
//! written through the same seam.

mod kubernetes;
mod memory;

pub use kubernetes::KubeStore;
pub use memory::{MemoryStore, Operation};
pub use kube::core::{Expression, Selector};

use crate::crd::ApplicationStatus;
use async_trait::async_trait;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Pod, Secret};
use kube::core::SelectorExt;
use std::collections::BTreeMap;
use thiserror::Error;

/// Object store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },
    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        kind: &'static str,
        namespace: String,
        name: String,
    },
    #[error("invalid {kind}: {reason}")]
    Invalid { kind: &'static str, reason: String },
    #[error("{operation} rejected: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

impl StoreError {
    pub fn not_found(kind: &'static str, namespace: &str, name: &str) -> Self {
        StoreError::NotFound {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    /// Whether the error signals that the object does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            StoreError::NotFound { .. } => true,
            StoreError::Kube(kube::Error::Api(api_err)) => api_err.code == 404,
            _ => false,
        }
    }
}

/// Secrets, Jobs and Pods in a label-indexed object store, plus the status
/// subresource of Applications
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch a secret by name
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, StoreError>;

    /// List the secrets in a namespace matching a selector
    async fn list_secrets(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<Secret>, StoreError>;

    /// Create a secret; `metadata.generateName` is honoured when `name` is unset
    ///
    /// Returns the stored object with its assigned name and UID.
    async fn create_secret(&self, secret: Secret) -> Result<Secret, StoreError>;

    /// Create or update a secret so that it matches the given object
    async fn apply_secret(&self, secret: Secret) -> Result<Secret, StoreError>;

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<(), StoreError>;

    async fn get_job(&self, namespace: &str, name: &str) -> Result<Job, StoreError>;

    async fn list_pods(&self, namespace: &str, selector: &Selector)
        -> Result<Vec<Pod>, StoreError>;

    /// Replace the status of an Application
    async fn patch_application_status(
        &self,
        namespace: &str,
        name: &str,
        status: &ApplicationStatus,
    ) -> Result<(), StoreError>;
}

/// Namespace of an object about to be written
/// Evaluate a selector against an object's labels; missing labels match as empty
pub fn selects(selector: &Selector, labels: Option<&BTreeMap<String, String>>) -> bool {
    match labels {
        Some(labels) => selector.matches(labels),
        None => selector.matches(&BTreeMap::new()),
    }
}

pub(crate) fn namespace_of(secret: &Secret) -> Result<String, StoreError> {
    secret
        .metadata
        .namespace
        .clone()
        .ok_or_else(|| StoreError::Invalid {
            kind: "secret",
            reason: "metadata.namespace is required".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(StoreError::not_found("secret", "ns", "db").is_not_found());
        assert!(!StoreError::Rejected {
            operation: "list secrets",
            reason: "forbidden".to_string()
        }
        .is_not_found());
    }

    #[test]
    fn test_kube_404_is_not_found() {
        let err = StoreError::Kube(kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: "secrets \"db\" not found".to_string(),
            reason: "NotFound".to_string(),
            code: 404,
        }));
        assert!(err.is_not_found());

        let forbidden = StoreError::Kube(kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: "forbidden".to_string(),
            reason: "Forbidden".to_string(),
            code: 403,
        }));
        assert!(!forbidden.is_not_found());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            StoreError::not_found("job", "apps", "mint").to_string(),
            "job apps/mint not found"
        );
    }

    #[test]
    fn test_selects_missing_labels() {
        let selector: Selector = [("app", "web")].into_iter().collect();
        assert!(!selects(&selector, None));
        assert!(selects(&Selector::default(), None));

        let absent: Selector = Expression::DoesNotExist("skip".to_string()).into();
        assert!(selects(&absent, None));
    }

    #[test]
    fn test_job_pod_selector_conversion() {
        use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
            LabelSelector, LabelSelectorRequirement,
        };

        let selector = Selector::try_from(LabelSelector {
            match_labels: Some(BTreeMap::from([("job-name".to_string(), "mint".to_string())])),
            match_expressions: Some(vec![LabelSelectorRequirement {
                key: "stage".to_string(),
                operator: "In".to_string(),
                values: Some(vec!["a".to_string(), "b".to_string()]),
            }]),
        })
        .unwrap();
        assert_eq!(selector.to_string(), "job-name=mint,stage in (a,b)");

        let labels = BTreeMap::from([
            ("job-name".to_string(), "mint".to_string()),
            ("stage".to_string(), "b".to_string()),
        ]);
        assert!(selects(&selector, Some(&labels)));
    }
}
