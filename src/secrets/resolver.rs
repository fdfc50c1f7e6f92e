//! # Secret Resolver
//!
//! Resolves one descriptor to its secret material:
//!
//! 1. Pass cache
//! 2. Binding to an existing secret in the target namespace
//! 3. Storage secret labeled for this application and descriptor
//! 4. Generation, persisted as a new storage secret
//!
//! Generators may resolve other descriptors (a TLS leaf resolving its CA)
//! through the same resolver, so the cache is shared across the whole pass.

use crate::crd::{ApplicationSpec, SecretType};
use crate::crypto::BlockingCrypto;
use crate::observability::metrics;
use crate::secrets::generators::{self, basic, docker, job, ssh, tls, GeneratedSecret};
use crate::secrets::{labels, AppIdentity, PassCache, ResolveError, ResolvedSecret};
use crate::store::ObjectStore;
use futures::future::BoxFuture;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use tracing::{debug, info, warn};

/// Pass-scoped resolver for one application
pub struct Resolver<'a> {
    store: &'a dyn ObjectStore,
    crypto: BlockingCrypto,
    app: &'a AppIdentity,
    spec: &'a ApplicationSpec,
    cache: PassCache,
}

impl std::fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("app", &self.app)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl<'a> Resolver<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        crypto: BlockingCrypto,
        app: &'a AppIdentity,
        spec: &'a ApplicationSpec,
    ) -> Self {
        Self {
            store,
            crypto,
            app,
            spec,
            cache: PassCache::new(),
        }
    }

    /// Resolve a descriptor, attempting it at most once per pass
    ///
    /// A non-fatal failure is replayed on later lookups. Re-entering a
    /// descriptor that is still being resolved fails with
    /// `ResolveError::Cycle`.
    pub fn resolve<'r>(
        &'r mut self,
        name: &'r str,
    ) -> BoxFuture<'r, Result<ResolvedSecret, ResolveError>> {
        Box::pin(async move {
            if let Some(hit) = self.cache.get(name) {
                return Ok(hit.clone());
            }
            if let Some(failure) = self.cache.failure(name) {
                return Err(failure);
            }
            if !self.cache.begin(name) {
                return Err(ResolveError::Cycle(name.to_string()));
            }

            let result = self.resolve_uncached(name).await;
            self.cache.finish(name);

            match result {
                Ok(resolved) => {
                    self.cache.insert(name, resolved.clone());
                    Ok(resolved)
                }
                Err(err) => {
                    self.cache.record_failure(name, &err);
                    Err(err)
                }
            }
        })
    }

    async fn resolve_uncached(&mut self, name: &str) -> Result<ResolvedSecret, ResolveError> {
        let spec = self.spec;
        if let Some(binding) = spec.binding_for(name) {
            return self.fetch_binding(name, &binding.secret).await;
        }

        if let Some(stored) = self.find_stored(name).await? {
            debug!(
                "Reusing stored secret {} for {}",
                stored.source_name, name
            );
            return Ok(stored);
        }

        self.generate(name).await
    }

    async fn fetch_binding(
        &self,
        descriptor: &str,
        secret_name: &str,
    ) -> Result<ResolvedSecret, ResolveError> {
        let namespace = &self.app.target_namespace;
        match self.store.get_secret(namespace, secret_name).await {
            Ok(secret) => {
                debug!(
                    "Resolved {} through binding to {}/{}",
                    descriptor, namespace, secret_name
                );
                Ok(ResolvedSecret::from_secret(&secret))
            }
            Err(e) if e.is_not_found() => Err(ResolveError::BindingTargetMissing {
                descriptor: descriptor.to_string(),
                namespace: namespace.clone(),
                secret: secret_name.to_string(),
            }),
            Err(e) => Err(ResolveError::Store(e)),
        }
    }

    /// Canonical storage secret: the match with the smallest UID
    async fn find_stored(&self, name: &str) -> Result<Option<ResolvedSecret>, ResolveError> {
        let mut found = self
            .store
            .list_secrets(&self.app.namespace, &labels::storage_selector(self.app, name))
            .await?;
        if found.len() > 1 {
            warn!(
                "Found {} storage secrets for {} in {}, using the one with the smallest UID",
                found.len(),
                name,
                self.app.namespace
            );
        }
        found.sort_by(|a, b| a.metadata.uid.cmp(&b.metadata.uid));
        Ok(found.first().map(ResolvedSecret::from_secret))
    }

    async fn generate(&mut self, name: &str) -> Result<ResolvedSecret, ResolveError> {
        let spec = self.spec;
        let Some(descriptor) = spec.secrets.get(name) else {
            return Err(ResolveError::not_found("secret", name));
        };

        let generated = match descriptor.secret_type {
            SecretType::Docker => docker::generate(descriptor),
            SecretType::Basic => basic::generate(descriptor),
            SecretType::SshAuth => ssh::generate(&self.crypto, descriptor).await?,
            SecretType::Tls => tls::generate(self, name, descriptor).await?,
            SecretType::Generated => {
                job::generate(self.store, &self.app.target_namespace, descriptor).await?
            }
            SecretType::Opaque => return Err(ResolveError::not_found("secret", name)),
        };

        self.persist(name, descriptor.secret_type, generated).await
    }

    async fn persist(
        &self,
        name: &str,
        secret_type: SecretType,
        generated: GeneratedSecret,
    ) -> Result<ResolvedSecret, ResolveError> {
        let secret = Secret {
            metadata: ObjectMeta {
                generate_name: Some(format!("{name}-")),
                namespace: Some(self.app.namespace.clone()),
                labels: Some(labels::storage_labels(self.app, name)),
                owner_references: Some(vec![self.app.owner_reference()]),
                ..ObjectMeta::default()
            },
            data: Some(
                generated
                    .data
                    .into_iter()
                    .map(|(k, v)| (k, ByteString(v)))
                    .collect(),
            ),
            type_: Some(generated.secret_type),
            ..Secret::default()
        };

        let created = self.store.create_secret(secret).await?;
        metrics::increment_generated_secrets(secret_type.as_str());

        let resolved = ResolvedSecret::from_secret(&created);
        info!(
            "Generated {} secret {} for {}/{} as {}",
            secret_type,
            name,
            self.app.namespace,
            self.app.name,
            resolved.source_name
        );
        Ok(resolved)
    }
}

impl generators::tls::CaSource for Resolver<'_> {
    fn resolve_ca<'r>(
        &'r mut self,
        name: &'r str,
    ) -> BoxFuture<'r, Result<ResolvedSecret, ResolveError>> {
        self.resolve(name)
    }

    fn crypto(&self) -> &BlockingCrypto {
        &self.crypto
    }
}
