//! # Secret Descriptors and Bindings
//!
//! Declarative secret requirements attached to an Application.

use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Secret type requested by a descriptor
///
/// Selects the generator used when no stored secret exists yet.
/// Unknown or empty type strings deserialize to `Opaque`.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SecretType {
    /// Docker registry credentials (`.dockerconfigjson`)
    Docker,
    /// Username/password pair
    Basic,
    /// TLS certificate and key, optionally chained to another descriptor's CA
    Tls,
    /// SSH private key
    SshAuth,
    /// Derived from the output of a batch Job
    Generated,
    /// Nothing to generate; the secret must already exist or be bound
    #[default]
    #[serde(other)]
    Opaque,
}

impl SecretType {
    /// Wire name of the type
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretType::Docker => "docker",
            SecretType::Basic => "basic",
            SecretType::Tls => "tls",
            SecretType::SshAuth => "ssh-auth",
            SecretType::Generated => "generated",
            SecretType::Opaque => "opaque",
        }
    }
}

impl std::fmt::Display for SecretType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl JsonSchema for SecretType {
    fn schema_name() -> Cow<'static, str> {
        Cow::Borrowed("SecretType")
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        // Plain string so that unknown types reach the controller and are treated as opaque
        let schema_value = serde_json::json!({
            "type": "string",
            "description": "Secret type: docker, basic, tls, ssh-auth, generated. Anything else is opaque."
        });
        Schema::try_from(schema_value).expect("Failed to create Schema for SecretType")
    }
}

/// Declarative specification of one secret the Application requires
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecretDescriptor {
    /// Generator to use when the secret does not exist yet
    #[serde(default, rename = "type")]
    pub secret_type: SecretType,
    /// Pre-supplied field values (seed data)
    /// Empty strings count as unseeded for generators that fill in missing fields
    #[serde(default, rename = "data")]
    pub seed_data: BTreeMap<String, String>,
    /// Generator-specific parameters
    #[serde(default)]
    #[schemars(schema_with = "params_schema")]
    pub params: BTreeMap<String, serde_json::Value>,
    /// An optional secret that cannot be resolved is skipped without error
    #[serde(default)]
    pub optional: bool,
}

impl SecretDescriptor {
    /// Create a descriptor of the given type with no seed data or params
    #[must_use]
    pub fn of_type(secret_type: SecretType) -> Self {
        Self {
            secret_type,
            ..Self::default()
        }
    }

    /// Add a seed data field
    #[must_use]
    pub fn with_seed(mut self, key: &str, value: &str) -> Self {
        self.seed_data.insert(key.to_string(), value.to_string());
        self
    }

    /// Add a generator parameter
    #[must_use]
    pub fn with_param(mut self, key: &str, value: serde_json::Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    /// Mark the descriptor optional
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Seed value for a key, treating empty strings as unseeded
    pub fn seed(&self, key: &str) -> Option<&str> {
        self.seed_data
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Wires a descriptor to an already-existing secret in the target namespace
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretBinding {
    /// Name of the existing secret
    pub secret: String,
    /// Descriptor name the existing secret stands in for
    pub target: String,
}

fn params_schema(_gen: &mut SchemaGenerator) -> Schema {
    let schema_value = serde_json::json!({
        "type": "object",
        "x-kubernetes-preserve-unknown-fields": true,
        "description": "Generator-specific parameters"
    });
    Schema::try_from(schema_value).expect("Failed to create Schema for params")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_type_wire_names() {
        let parsed: SecretType = serde_json::from_str("\"ssh-auth\"").unwrap();
        assert_eq!(parsed, SecretType::SshAuth);
        assert_eq!(serde_json::to_string(&SecretType::SshAuth).unwrap(), "\"ssh-auth\"");
    }

    #[test]
    fn test_unknown_and_empty_types_are_opaque() {
        let unknown: SecretType = serde_json::from_str("\"certificate\"").unwrap();
        let empty: SecretType = serde_json::from_str("\"\"").unwrap();
        assert_eq!(unknown, SecretType::Opaque);
        assert_eq!(empty, SecretType::Opaque);
    }

    #[test]
    fn test_descriptor_deserializes_wire_names() {
        let descriptor: SecretDescriptor = serde_json::from_value(serde_json::json!({
            "type": "tls",
            "data": { "tls.crt": "" },
            "params": { "caSecret": "ca", "sans": ["a", "b"] },
            "optional": true
        }))
        .unwrap();
        assert_eq!(descriptor.secret_type, SecretType::Tls);
        assert!(descriptor.optional);
        assert_eq!(descriptor.seed("tls.crt"), None);
        assert_eq!(descriptor.params["caSecret"], serde_json::json!("ca"));
    }

    #[test]
    fn test_descriptor_defaults() {
        let descriptor: SecretDescriptor = serde_json::from_str("{}").unwrap();
        assert_eq!(descriptor.secret_type, SecretType::Opaque);
        assert!(!descriptor.optional);
        assert!(descriptor.seed_data.is_empty());
    }
}
