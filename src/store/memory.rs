//! # In-Memory Object Store
//!
//! `ObjectStore` held entirely in process. Assigns names from `generateName`
//! and UIDs the way the API server does, evaluates label selectors locally,
//! and supports injecting faults per operation.

use crate::crd::ApplicationStatus;
use crate::store::{namespace_of, selects, ObjectStore, Selector, StoreError};
use async_trait::async_trait;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Pod, Secret};
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Alphabet the API server uses for `generateName` suffixes
const NAME_SUFFIX_CHARSET: &[u8] = b"bcdfghjklmnpqrstvwxz2456789";
const NAME_SUFFIX_LENGTH: usize = 5;

type Key = (String, String);

/// Store operation, used for fault injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetSecret,
    ListSecrets,
    CreateSecret,
    ApplySecret,
    DeleteSecret,
    GetJob,
    ListPods,
    PatchStatus,
}

impl Operation {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GetSecret => "get secret",
            Operation::ListSecrets => "list secrets",
            Operation::CreateSecret => "create secret",
            Operation::ApplySecret => "apply secret",
            Operation::DeleteSecret => "delete secret",
            Operation::GetJob => "get job",
            Operation::ListPods => "list pods",
            Operation::PatchStatus => "patch application status",
        }
    }
}

#[derive(Debug, Default)]
struct State {
    secrets: BTreeMap<Key, Secret>,
    jobs: BTreeMap<Key, Job>,
    pods: BTreeMap<Key, Pod>,
    statuses: BTreeMap<Key, ApplicationStatus>,
    faults: HashMap<Operation, String>,
    calls: HashMap<Operation, usize>,
}

impl State {
    /// Count the call and return the injected fault, if any
    fn enter(&mut self, operation: Operation) -> Result<(), StoreError> {
        *self.calls.entry(operation).or_default() += 1;
        match self.faults.get(&operation) {
            Some(reason) => Err(StoreError::Rejected {
                operation: operation.as_str(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn unique_name(&self, namespace: &str, prefix: &str) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let suffix: String = (0..NAME_SUFFIX_LENGTH)
                .map(|_| {
                    let idx = rng.gen_range(0..NAME_SUFFIX_CHARSET.len());
                    NAME_SUFFIX_CHARSET[idx] as char
                })
                .collect();
            let candidate = format!("{prefix}{suffix}");
            if !self
                .secrets
                .contains_key(&(namespace.to_string(), candidate.clone()))
            {
                return candidate;
            }
        }
    }
}

/// In-process object store
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

fn ensure_uid(metadata: &mut k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta) {
    if metadata.uid.is_none() {
        metadata.uid = Some(uuid::Uuid::new_v4().to_string());
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a secret; a UID is assigned when missing
    pub fn insert_secret(&self, mut secret: Secret) -> Secret {
        ensure_uid(&mut secret.metadata);
        let namespace = secret.metadata.namespace.clone().unwrap_or_default();
        let name = secret.metadata.name.clone().unwrap_or_default();
        self.lock().secrets.insert(key(&namespace, &name), secret.clone());
        secret
    }

    pub fn insert_job(&self, mut job: Job) {
        ensure_uid(&mut job.metadata);
        let namespace = job.metadata.namespace.clone().unwrap_or_default();
        let name = job.metadata.name.clone().unwrap_or_default();
        self.lock().jobs.insert(key(&namespace, &name), job);
    }

    pub fn insert_pod(&self, mut pod: Pod) {
        ensure_uid(&mut pod.metadata);
        let namespace = pod.metadata.namespace.clone().unwrap_or_default();
        let name = pod.metadata.name.clone().unwrap_or_default();
        self.lock().pods.insert(key(&namespace, &name), pod);
    }

    /// Current copy of a secret
    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.lock().secrets.get(&key(namespace, name)).cloned()
    }

    /// All secrets in a namespace, ordered by name
    pub fn secrets_in(&self, namespace: &str) -> Vec<Secret> {
        self.lock()
            .secrets
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, s)| s.clone())
            .collect()
    }

    /// Last status written for an Application
    pub fn application_status(&self, namespace: &str, name: &str) -> Option<ApplicationStatus> {
        self.lock().statuses.get(&key(namespace, name)).cloned()
    }

    /// Make every subsequent call of `operation` fail with a non-absence error
    pub fn fail(&self, operation: Operation, reason: &str) {
        self.lock().faults.insert(operation, reason.to_string());
    }

    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }

    /// Number of times `operation` has been invoked
    pub fn calls(&self, operation: Operation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, StoreError> {
        let mut state = self.lock();
        state.enter(Operation::GetSecret)?;
        state
            .secrets
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| StoreError::not_found("secret", namespace, name))
    }

    async fn list_secrets(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<Secret>, StoreError> {
        let mut state = self.lock();
        state.enter(Operation::ListSecrets)?;
        Ok(state
            .secrets
            .iter()
            .filter(|((ns, _), s)| ns == namespace && selects(selector, s.metadata.labels.as_ref()))
            .map(|(_, s)| s.clone())
            .collect())
    }

    async fn create_secret(&self, mut secret: Secret) -> Result<Secret, StoreError> {
        let namespace = namespace_of(&secret)?;
        let mut state = self.lock();
        state.enter(Operation::CreateSecret)?;

        let name = match (&secret.metadata.name, &secret.metadata.generate_name) {
            (Some(name), _) => name.clone(),
            (None, Some(prefix)) => state.unique_name(&namespace, prefix),
            (None, None) => {
                return Err(StoreError::Invalid {
                    kind: "secret",
                    reason: "metadata.name or metadata.generateName is required".to_string(),
                })
            }
        };
        if state.secrets.contains_key(&key(&namespace, &name)) {
            return Err(StoreError::AlreadyExists {
                kind: "secret",
                namespace,
                name,
            });
        }

        secret.metadata.name = Some(name.clone());
        secret.metadata.uid = Some(uuid::Uuid::new_v4().to_string());
        state.secrets.insert(key(&namespace, &name), secret.clone());
        Ok(secret)
    }

    async fn apply_secret(&self, mut secret: Secret) -> Result<Secret, StoreError> {
        let namespace = namespace_of(&secret)?;
        let name = secret.metadata.name.clone().ok_or_else(|| StoreError::Invalid {
            kind: "secret",
            reason: "metadata.name is required for apply".to_string(),
        })?;
        let mut state = self.lock();
        state.enter(Operation::ApplySecret)?;

        let existing_uid = state
            .secrets
            .get(&key(&namespace, &name))
            .and_then(|s| s.metadata.uid.clone());
        secret.metadata.uid = existing_uid.or_else(|| Some(uuid::Uuid::new_v4().to_string()));
        state.secrets.insert(key(&namespace, &name), secret.clone());
        Ok(secret)
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.enter(Operation::DeleteSecret)?;
        state
            .secrets
            .remove(&key(namespace, name))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("secret", namespace, name))
    }

    async fn get_job(&self, namespace: &str, name: &str) -> Result<Job, StoreError> {
        let mut state = self.lock();
        state.enter(Operation::GetJob)?;
        state
            .jobs
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| StoreError::not_found("job", namespace, name))
    }

    async fn list_pods(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<Pod>, StoreError> {
        let mut state = self.lock();
        state.enter(Operation::ListPods)?;
        Ok(state
            .pods
            .iter()
            .filter(|((ns, _), p)| ns == namespace && selects(selector, p.metadata.labels.as_ref()))
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn patch_application_status(
        &self,
        namespace: &str,
        name: &str,
        status: &ApplicationStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.enter(Operation::PatchStatus)?;
        state.statuses.insert(key(namespace, name), status.clone());
        Ok(())
    }
}
