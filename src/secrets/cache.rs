//! # Pass Cache
//!
//! Resolved secrets of the current pass, the failures that are replayed
//! instead of retried, and the descriptors whose resolution is still in
//! flight.

use crate::secrets::{ErrorClass, ResolveError};
use k8s_openapi::api::core::v1::Secret;
use std::collections::{BTreeMap, BTreeSet};

/// Secret material resolved for one descriptor during a pass
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    pub data: BTreeMap<String, Vec<u8>>,
    pub secret_type: String,
    /// Name of the stored object, distinct from the descriptor name
    pub source_name: String,
    pub uid: Option<String>,
}

impl ResolvedSecret {
    /// Copy data and type out of a stored secret
    ///
    /// `stringData` entries win over `data`, as they do on write.
    pub fn from_secret(secret: &Secret) -> Self {
        let mut data: BTreeMap<String, Vec<u8>> = secret
            .data
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), v.0.clone()))
            .collect();
        for (k, v) in secret.string_data.iter().flatten() {
            data.insert(k.clone(), v.as_bytes().to_vec());
        }

        Self {
            data,
            secret_type: secret
                .type_
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Opaque".to_string()),
            source_name: secret.metadata.name.clone().unwrap_or_default(),
            uid: secret.metadata.uid.clone(),
        }
    }

    /// Non-empty value of a field
    pub fn field(&self, key: &str) -> Option<&[u8]> {
        self.data
            .get(key)
            .map(Vec::as_slice)
            .filter(|v| !v.is_empty())
    }

    /// Non-empty UTF-8 value of a field
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(|v| std::str::from_utf8(v).ok())
    }
}

impl std::fmt::Debug for ResolvedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecret")
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .field("secret_type", &self.secret_type)
            .field("source_name", &self.source_name)
            .field("uid", &self.uid)
            .finish()
    }
}

/// Pass-scoped cache keyed by descriptor name
#[derive(Debug, Default)]
pub struct PassCache {
    resolved: BTreeMap<String, ResolvedSecret>,
    failed: BTreeMap<String, (ErrorClass, String)>,
    in_progress: BTreeSet<String>,
}

impl PassCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedSecret> {
        self.resolved.get(name)
    }

    pub fn insert(&mut self, name: &str, secret: ResolvedSecret) {
        self.resolved.insert(name.to_string(), secret);
    }

    /// Earlier failure of `name` in this pass, as a `ResolveError::Repeated`
    pub fn failure(&self, name: &str) -> Option<ResolveError> {
        self.failed
            .get(name)
            .map(|(class, cause)| ResolveError::Repeated {
                class: *class,
                cause: cause.clone(),
            })
    }

    /// Remember a failure so later lookups replay it
    ///
    /// Fatal errors abort the pass and are never recorded.
    pub fn record_failure(&mut self, name: &str, err: &ResolveError) {
        let class = err.classify();
        if class != ErrorClass::Fatal {
            self.failed
                .insert(name.to_string(), (class, err.to_string()));
        }
    }

    /// Mark `name` in flight; `false` if it already was
    pub fn begin(&mut self, name: &str) -> bool {
        self.in_progress.insert(name.to_string())
    }

    pub fn finish(&mut self, name: &str) {
        self.in_progress.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use k8s_openapi::ByteString;

    #[test]
    fn test_from_secret_merges_string_data() {
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some("db-abcde".to_string()),
                uid: Some("u-1".to_string()),
                ..ObjectMeta::default()
            },
            data: Some(BTreeMap::from([
                ("username".to_string(), ByteString(b"admin".to_vec())),
                ("password".to_string(), ByteString(b"old".to_vec())),
            ])),
            string_data: Some(BTreeMap::from([(
                "password".to_string(),
                "new".to_string(),
            )])),
            type_: Some("kubernetes.io/basic-auth".to_string()),
            ..Secret::default()
        };

        let resolved = ResolvedSecret::from_secret(&secret);
        assert_eq!(resolved.field_str("username"), Some("admin"));
        assert_eq!(resolved.field_str("password"), Some("new"));
        assert_eq!(resolved.secret_type, "kubernetes.io/basic-auth");
        assert_eq!(resolved.source_name, "db-abcde");
    }

    #[test]
    fn test_missing_type_is_opaque() {
        let resolved = ResolvedSecret::from_secret(&Secret::default());
        assert_eq!(resolved.secret_type, "Opaque");
        assert_eq!(resolved.field("anything"), None);
    }

    #[test]
    fn test_failures_are_replayed() {
        let mut cache = PassCache::new();
        assert!(cache.failure("ca").is_none());

        cache.record_failure("ca", &ResolveError::JobNotDone);
        cache.record_failure("tls", &ResolveError::not_found("secret", "ca"));
        let replayed = cache.failure("ca").unwrap();
        assert_eq!(replayed.classify(), ErrorClass::Generator);
        assert_eq!(replayed.to_string(), "job not complete");
        assert_eq!(cache.failure("tls").unwrap().classify(), ErrorClass::Absent);
    }

    #[test]
    fn test_fatal_failures_are_not_recorded() {
        let mut cache = PassCache::new();
        cache.record_failure(
            "db",
            &ResolveError::InvalidApplication("no uid".to_string()),
        );
        assert!(cache.failure("db").is_none());
    }

    #[test]
    fn test_in_progress_marker() {
        let mut cache = PassCache::new();
        assert!(cache.begin("tls"));
        assert!(!cache.begin("tls"));
        cache.finish("tls");
        assert!(cache.begin("tls"));
    }

    #[test]
    fn test_debug_hides_values() {
        let resolved = ResolvedSecret {
            data: BTreeMap::from([("password".to_string(), b"hunter2".to_vec())]),
            secret_type: "Opaque".to_string(),
            source_name: "db".to_string(),
            uid: None,
        };
        let rendered = format!("{resolved:?}");
        assert!(rendered.contains("password"));
        assert!(!rendered.contains("hunter2"));
    }
}
