//! Shared fixtures for the integration tests
//!
//! Every test drives the real engine against `MemoryStore` and `RcgenCrypto`.

#![allow(dead_code, reason = "each test binary uses a different subset of the fixtures")]

use app_secrets_controller::crd::{Application, ApplicationSpec, SecretDescriptor};
use app_secrets_controller::crypto::{CryptoProvider, RcgenCrypto};
use app_secrets_controller::store::MemoryStore;
use k8s_openapi::api::batch::v1::{Job, JobSpec, JobStatus};
use k8s_openapi::api::core::v1::{
    ContainerState, ContainerStateTerminated, ContainerStatus, Pod, PodStatus, Secret,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::ByteString;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const APP_NAME: &str = "storefront";
pub const APP_NAMESPACE: &str = "team-a";
pub const APP_UID: &str = "6f1c7a52-0d1e-4c55-9a0b-3b1f6c2f9e10";

pub fn crypto() -> Arc<dyn CryptoProvider> {
    Arc::new(RcgenCrypto::new())
}

/// Application in `APP_NAMESPACE` declaring the given descriptors
pub fn application(secrets: &[(&str, SecretDescriptor)]) -> Application {
    let mut spec = ApplicationSpec::default();
    for (name, descriptor) in secrets {
        spec.secrets.insert((*name).to_string(), descriptor.clone());
    }
    application_with_spec(spec)
}

pub fn application_with_spec(spec: ApplicationSpec) -> Application {
    let mut app = Application::new(APP_NAME, spec);
    app.metadata.namespace = Some(APP_NAMESPACE.to_string());
    app.metadata.uid = Some(APP_UID.to_string());
    app.metadata.generation = Some(1);
    app
}

pub fn secret(namespace: &str, name: &str, data: &[(&str, &str)]) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..ObjectMeta::default()
        },
        data: Some(
            data.iter()
                .map(|(k, v)| ((*k).to_string(), ByteString(v.as_bytes().to_vec())))
                .collect(),
        ),
        ..Secret::default()
    }
}

/// Value of a data field as a string
pub fn field(secret: &Secret, key: &str) -> String {
    let bytes = secret
        .data
        .as_ref()
        .and_then(|d| d.get(key))
        .map(|b| b.0.clone())
        .unwrap_or_default();
    String::from_utf8(bytes).unwrap()
}

pub fn has_field(secret: &Secret, key: &str) -> bool {
    secret.data.as_ref().is_some_and(|d| d.contains_key(key))
}

/// Storage secrets generated for a descriptor
pub fn storage_secrets(store: &MemoryStore, descriptor: &str) -> Vec<Secret> {
    store
        .secrets_in(APP_NAMESPACE)
        .into_iter()
        .filter(|s| {
            s.metadata
                .labels
                .as_ref()
                .and_then(|l| l.get("apps.octopilot.io/secret-name"))
                .is_some_and(|v| v == descriptor)
        })
        .collect()
}

/// The single storage secret of a descriptor
pub fn storage_secret(store: &MemoryStore, descriptor: &str) -> Secret {
    let mut found = storage_secrets(store, descriptor);
    assert_eq!(found.len(), 1, "expected one storage secret for {descriptor}");
    found.remove(0)
}

fn job_labels(job: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("job-name".to_string(), job.to_string())])
}

/// Job in `namespace` that has succeeded `succeeded` times
pub fn job(namespace: &str, name: &str, succeeded: i32) -> Job {
    Job {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..ObjectMeta::default()
        },
        spec: Some(JobSpec {
            selector: Some(LabelSelector {
                match_labels: Some(job_labels(name)),
                ..LabelSelector::default()
            }),
            ..JobSpec::default()
        }),
        status: Some(JobStatus {
            succeeded: Some(succeeded),
            ..JobStatus::default()
        }),
    }
}

/// Pod of job `job` whose only container terminated with the given exit code and message
pub fn job_pod(namespace: &str, job: &str, exit_code: i32, message: Option<&str>) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(format!("{job}-pod-{exit_code}")),
            namespace: Some(namespace.to_string()),
            labels: Some(job_labels(job)),
            ..ObjectMeta::default()
        },
        status: Some(PodStatus {
            container_statuses: Some(vec![ContainerStatus {
                name: "main".to_string(),
                state: Some(ContainerState {
                    terminated: Some(ContainerStateTerminated {
                        exit_code,
                        message: message.map(str::to_string),
                        ..ContainerStateTerminated::default()
                    }),
                    ..ContainerState::default()
                }),
                ..ContainerStatus::default()
            }]),
            ..PodStatus::default()
        }),
        ..Pod::default()
    }
}

/// Finished job whose output is `message`
pub fn finished_job(store: &MemoryStore, namespace: &str, name: &str, message: &str) {
    store.insert_job(job(namespace, name, 1));
    store.insert_pod(job_pod(namespace, name, 0, Some(message)));
}
