//! # Validation
//!
//! Validates Application resources before any secret is resolved.
//!
//! Descriptor names become object names and label values, so they must be
//! valid RFC 1123 subdomains no longer than a label value.

use crate::crd::{Application, ApplicationSpec};
use anyhow::Result;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::warn;

/// Maximum length of a Kubernetes label value
const MAX_LABEL_VALUE_LENGTH: usize = 63;

/// Maximum length of a Kubernetes object name
const MAX_NAME_LENGTH: usize = 253;

/// Validate Kubernetes resource name (RFC 1123 subdomain)
/// Format: lowercase alphanumeric, hyphens, dots
/// Length: 1-253 characters
/// Cannot start or end with hyphen or dot
pub fn validate_kubernetes_name(name: &str, field_name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(anyhow::anyhow!("{field_name} cannot be empty"));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(anyhow::anyhow!(
            "{} '{}' exceeds maximum length of {} characters (got {})",
            field_name,
            name,
            MAX_NAME_LENGTH,
            name.len()
        ));
    }

    let name_regex =
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
            .map_err(|e| anyhow::anyhow!("Failed to compile regex: {e}"))?;

    if !name_regex.is_match(name) {
        return Err(anyhow::anyhow!(
            "{field_name} '{name}' must be a valid Kubernetes name (lowercase alphanumeric, hyphens, dots; cannot start/end with hyphen or dot)"
        ));
    }

    Ok(())
}

/// Validate Kubernetes namespace (RFC 1123 label)
pub fn validate_kubernetes_namespace(namespace: &str, field_name: &str) -> Result<()> {
    if namespace.is_empty() {
        return Err(anyhow::anyhow!("{field_name} cannot be empty"));
    }

    if namespace.len() > MAX_LABEL_VALUE_LENGTH {
        return Err(anyhow::anyhow!(
            "{} '{}' exceeds maximum length of {} characters (got {})",
            field_name,
            namespace,
            MAX_LABEL_VALUE_LENGTH,
            namespace.len()
        ));
    }

    let namespace_regex = Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$")
        .map_err(|e| anyhow::anyhow!("Failed to compile regex: {e}"))?;

    if !namespace_regex.is_match(namespace) {
        return Err(anyhow::anyhow!(
            "{field_name} '{namespace}' must be a valid Kubernetes namespace (lowercase alphanumeric, hyphens; cannot start/end with hyphen)"
        ));
    }

    Ok(())
}

/// A name that is also written as a label value
fn validate_labelled_name(name: &str, field_name: &str) -> Result<()> {
    validate_kubernetes_name(name, field_name)?;
    if name.len() > MAX_LABEL_VALUE_LENGTH {
        return Err(anyhow::anyhow!(
            "{} '{}' exceeds the label value limit of {} characters (got {})",
            field_name,
            name,
            MAX_LABEL_VALUE_LENGTH,
            name.len()
        ));
    }
    Ok(())
}

/// Validate the secret descriptors and bindings of an Application
///
/// Bindings whose target is not a declared descriptor are logged and ignored.
pub fn validate_application_spec(spec: &ApplicationSpec, max_secrets: usize) -> Result<()> {
    if let Some(target_namespace) = &spec.target_namespace {
        validate_kubernetes_namespace(target_namespace, "spec.targetNamespace")?;
    }

    if spec.secrets.len() > max_secrets {
        return Err(anyhow::anyhow!(
            "spec.secrets declares {} secrets, more than the maximum of {}",
            spec.secrets.len(),
            max_secrets
        ));
    }

    for name in spec.secrets.keys() {
        validate_labelled_name(name, "spec.secrets key")?;
    }

    let mut bound_targets = BTreeSet::new();
    for (index, binding) in spec.secret_bindings.iter().enumerate() {
        validate_kubernetes_name(&binding.secret, &format!("spec.secretBindings[{index}].secret"))?;
        if binding.target.is_empty() {
            return Err(anyhow::anyhow!(
                "spec.secretBindings[{index}].target cannot be empty"
            ));
        }
        if !bound_targets.insert(binding.target.as_str()) {
            return Err(anyhow::anyhow!(
                "spec.secretBindings binds '{}' more than once",
                binding.target
            ));
        }
        if !spec.secrets.contains_key(&binding.target) {
            warn!(
                "Binding of secret '{}' targets undeclared secret '{}', ignoring",
                binding.secret, binding.target
            );
        }
    }

    Ok(())
}

/// Validate an Application resource
pub fn validate_application(app: &Application, max_secrets: usize) -> Result<()> {
    let name = app.metadata.name.as_deref().unwrap_or_default();
    validate_labelled_name(name, "metadata.name")?;
    let namespace = app.metadata.namespace.as_deref().unwrap_or_default();
    validate_kubernetes_namespace(namespace, "metadata.namespace")?;
    validate_application_spec(&app.spec, max_secrets)
}
