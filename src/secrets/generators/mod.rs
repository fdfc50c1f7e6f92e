//! # Secret Generators
//!
//! One generator per secret type. Generators only produce material; the
//! resolver persists it as a storage secret.
//!
//! - `docker.rs` - Registry credentials
//! - `basic.rs` - Username/password pairs
//! - `ssh.rs` - SSH private keys
//! - `tls.rs` - Certificates, optionally chained to another descriptor's CA
//! - `job.rs` - Secrets derived from batch Job output

pub mod basic;
pub mod docker;
pub mod job;
pub mod ssh;
pub mod tls;

use crate::crd::SecretDescriptor;
use crate::secrets::ResolveError;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

pub const DOCKER_CONFIG_JSON_KEY: &str = ".dockerconfigjson";
pub const BASIC_AUTH_USERNAME_KEY: &str = "username";
pub const BASIC_AUTH_PASSWORD_KEY: &str = "password";
pub const TLS_CERT_KEY: &str = "tls.crt";
pub const TLS_PRIVATE_KEY_KEY: &str = "tls.key";
pub const CA_CERT_KEY: &str = "ca.crt";
pub const CA_KEY_KEY: &str = "ca.key";
pub const SSH_AUTH_PRIVATE_KEY: &str = "ssh-privatekey";
pub const CONTENT_KEY: &str = "content";

pub const SECRET_TYPE_DOCKER_CONFIG_JSON: &str = "kubernetes.io/dockerconfigjson";
pub const SECRET_TYPE_BASIC_AUTH: &str = "kubernetes.io/basic-auth";
pub const SECRET_TYPE_TLS: &str = "kubernetes.io/tls";
pub const SECRET_TYPE_SSH_AUTH: &str = "kubernetes.io/ssh-auth";
pub const SECRET_TYPE_OPAQUE: &str = "Opaque";

/// Freshly generated secret material, not yet persisted
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratedSecret {
    pub secret_type: String,
    pub data: BTreeMap<String, Vec<u8>>,
}

impl GeneratedSecret {
    /// Start from the non-empty seed values of `keys`
    pub fn seeded(secret_type: &str, descriptor: &SecretDescriptor, keys: &[&str]) -> Self {
        let data = keys
            .iter()
            .filter_map(|key| {
                descriptor
                    .seed(key)
                    .map(|value| ((*key).to_string(), value.as_bytes().to_vec()))
            })
            .collect();
        Self {
            secret_type: secret_type.to_string(),
            data,
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.data.get(key).is_some_and(|v| !v.is_empty())
    }

    pub fn set(&mut self, key: &str, value: impl Into<Vec<u8>>) {
        self.data.insert(key.to_string(), value.into());
    }
}

impl std::fmt::Debug for GeneratedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedSecret")
            .field("secret_type", &self.secret_type)
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Deserialize a descriptor's params into a typed struct
pub(crate) fn parse_params<T: DeserializeOwned>(
    descriptor: &SecretDescriptor,
) -> Result<T, ResolveError> {
    let object: serde_json::Map<String, serde_json::Value> = descriptor
        .params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    serde_json::from_value(serde_json::Value::Object(object))
        .map_err(|e| ResolveError::InvalidParams(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::SecretType;

    #[test]
    fn test_seeded_skips_empty_and_unlisted_keys() {
        let descriptor = SecretDescriptor::of_type(SecretType::Tls)
            .with_seed(TLS_CERT_KEY, "CERT")
            .with_seed(TLS_PRIVATE_KEY_KEY, "")
            .with_seed("extra", "ignored");
        let generated = GeneratedSecret::seeded(
            SECRET_TYPE_TLS,
            &descriptor,
            &[TLS_CERT_KEY, TLS_PRIVATE_KEY_KEY],
        );
        assert!(generated.has(TLS_CERT_KEY));
        assert!(!generated.has(TLS_PRIVATE_KEY_KEY));
        assert_eq!(generated.data.len(), 1);
    }

    #[test]
    fn test_parse_params_reports_type_errors() {
        #[derive(Debug, serde::Deserialize)]
        struct Params {
            #[allow(dead_code, reason = "only the parse result matters")]
            count: u32,
        }

        let descriptor = SecretDescriptor::default().with_param("count", serde_json::json!("many"));
        let err = parse_params::<Params>(&descriptor).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidParams(_)));
    }
}
