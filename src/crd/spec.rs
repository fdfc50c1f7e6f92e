//! # Application Spec
//!
//! Main CRD specification types.

use crate::crd::{SecretBinding, SecretDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Application Custom Resource Definition
///
/// Declares the secrets an application needs. The controller resolves every
/// descriptor (reusing, binding or generating the backing secret) and projects
/// the result into the target namespace under the descriptor's own name.
///
/// # Example
///
/// ```yaml
/// apiVersion: apps.octopilot.io/v1beta1
/// kind: Application
/// metadata:
///   name: storefront
///   namespace: team-a
/// spec:
///   targetNamespace: storefront-prod
///   secrets:
///     db-credentials:
///       type: basic
///       data:
///         username: storefront
///     frontend-tls:
///       type: tls
///       params:
///         caSecret: internal-ca
///         sans: ["storefront.svc", "10.0.0.12"]
///     internal-ca:
///       type: tls
///   secretBindings:
///     - secret: shared-registry-credentials
///       target: registry
/// ```
#[derive(kube::CustomResource, Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "Application",
    group = "apps.octopilot.io",
    version = "v1beta1",
    namespaced,
    status = "crate::crd::ApplicationStatus",
    shortname = "oapp",
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}, {"name":"Secrets", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Secrets\")].status"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    /// Namespace projections, bound secrets and jobs live in
    /// Defaults to the Application's own namespace
    #[serde(default)]
    pub target_namespace: Option<String>,
    /// Secret descriptors keyed by name
    /// The name is also the name of the projected secret
    #[serde(default)]
    pub secrets: BTreeMap<String, SecretDescriptor>,
    /// Bindings of descriptors to existing secrets
    #[serde(default)]
    pub secret_bindings: Vec<SecretBinding>,
}

impl ApplicationSpec {
    /// Existing secret bound to a descriptor, if any
    pub fn binding_for(&self, descriptor: &str) -> Option<&SecretBinding> {
        self.secret_bindings.iter().find(|b| b.target == descriptor)
    }
}
