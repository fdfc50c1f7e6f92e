//! # Kubernetes Object Store
//!
//! `ObjectStore` backed by the Kubernetes API.

use crate::crd::{Application, ApplicationStatus};
use crate::store::{namespace_of, ObjectStore, Selector, StoreError};
use async_trait::async_trait;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Pod, Secret};
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::Client;
use tracing::debug;

/// Object store that talks to the cluster through a `kube::Client`
///
/// Projections are written with server-side apply under `field_manager`.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    field_manager: String,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore")
            .field("field_manager", &self.field_manager)
            .finish_non_exhaustive()
    }
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn list_params(selector: &Selector) -> ListParams {
        if selector.selects_all() {
            ListParams::default()
        } else {
            ListParams::default().labels_from(selector)
        }
    }
}

/// Map a 404 from the API server to `StoreError::NotFound`
fn classify(err: kube::Error, kind: &'static str, namespace: &str, name: &str) -> StoreError {
    match err {
        kube::Error::Api(api_err) if api_err.code == 404 => {
            StoreError::not_found(kind, namespace, name)
        }
        kube::Error::Api(api_err) if api_err.code == 409 => StoreError::AlreadyExists {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        other => StoreError::Kube(other),
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, StoreError> {
        self.secrets(namespace)
            .get(name)
            .await
            .map_err(|e| classify(e, "secret", namespace, name))
    }

    async fn list_secrets(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<Secret>, StoreError> {
        let list = self
            .secrets(namespace)
            .list(&Self::list_params(selector))
            .await?;
        Ok(list.items)
    }

    async fn create_secret(&self, secret: Secret) -> Result<Secret, StoreError> {
        let namespace = namespace_of(&secret)?;
        let display_name = secret
            .metadata
            .name
            .clone()
            .or_else(|| secret.metadata.generate_name.clone())
            .unwrap_or_default();

        let created = self
            .secrets(&namespace)
            .create(&PostParams::default(), &secret)
            .await
            .map_err(|e| classify(e, "secret", &namespace, &display_name))?;

        debug!(
            "Created secret {}/{}",
            namespace,
            created.metadata.name.as_deref().unwrap_or(&display_name)
        );
        Ok(created)
    }

    async fn apply_secret(&self, secret: Secret) -> Result<Secret, StoreError> {
        let namespace = namespace_of(&secret)?;
        let name = secret.metadata.name.clone().ok_or_else(|| StoreError::Invalid {
            kind: "secret",
            reason: "metadata.name is required for apply".to_string(),
        })?;

        let patch_params = PatchParams::apply(&self.field_manager).force();
        let applied = self
            .secrets(&namespace)
            .patch(&name, &patch_params, &Patch::Apply(&secret))
            .await?;
        Ok(applied)
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        self.secrets(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| classify(e, "secret", namespace, name))?;
        Ok(())
    }

    async fn get_job(&self, namespace: &str, name: &str) -> Result<Job, StoreError> {
        let api: Api<Job> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .map_err(|e| classify(e, "job", namespace, name))
    }

    async fn list_pods(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<Pod>, StoreError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&Self::list_params(selector)).await?;
        Ok(list.items)
    }

    async fn patch_application_status(
        &self,
        namespace: &str,
        name: &str,
        status: &ApplicationStatus,
    ) -> Result<(), StoreError> {
        let api: Api<Application> = Api::namespaced(self.client.clone(), namespace);
        let patch = serde_json::json!({ "status": status });
        api.patch_status(
            name,
            &PatchParams::apply(&self.field_manager),
            &Patch::Merge(patch),
        )
        .await
        .map_err(|e| classify(e, "application", namespace, name))?;
        Ok(())
    }
}
