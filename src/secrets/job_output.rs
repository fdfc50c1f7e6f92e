//! # Job Output Extractor
//!
//! Recovers the payload a finished batch Job left behind. The payload is the
//! termination message of a container that exited successfully.

use crate::observability::metrics;
use crate::secrets::ResolveError;
use crate::store::{ObjectStore, Selector};
use k8s_openapi::api::core::v1::Pod;
use tracing::debug;

/// Read the output of job `job_name` in `namespace`
///
/// A missing job is `NotFound`. A job that has not succeeded exactly once is
/// `JobNotDone`. A succeeded job without any matching pods is also reported
/// as `NotFound` (kind `pods`).
pub async fn extract_job_output(
    store: &dyn ObjectStore,
    namespace: &str,
    job_name: &str,
) -> Result<Vec<u8>, ResolveError> {
    let result = read_output(store, namespace, job_name).await;
    metrics::increment_job_output_results(match &result {
        Ok(_) => "ok",
        Err(ResolveError::JobNotDone) => "not_done",
        Err(ResolveError::JobNoOutput) => "no_output",
        Err(ResolveError::NotFound { .. }) => "not_found",
        Err(_) => "error",
    });
    result
}

async fn read_output(
    store: &dyn ObjectStore,
    namespace: &str,
    job_name: &str,
) -> Result<Vec<u8>, ResolveError> {
    let job = store.get_job(namespace, job_name).await?;

    let succeeded = job.status.as_ref().and_then(|s| s.succeeded).unwrap_or(0);
    if succeeded != 1 {
        debug!(
            "Job {}/{} not complete (succeeded: {})",
            namespace, job_name, succeeded
        );
        return Err(ResolveError::JobNotDone);
    }

    let label_selector = job
        .spec
        .as_ref()
        .and_then(|s| s.selector.as_ref())
        .ok_or_else(|| ResolveError::InvalidJob(format!("job {job_name} has no pod selector")))?;
    let selector = Selector::try_from(label_selector.clone())
        .map_err(|e| ResolveError::InvalidJob(e.to_string()))?;

    let pods = store.list_pods(namespace, &selector).await?;
    if pods.is_empty() {
        return Err(ResolveError::not_found("pods", job_name));
    }

    pods.iter()
        .find_map(termination_message)
        .map(|message| message.as_bytes().to_vec())
        .ok_or(ResolveError::JobNoOutput)
}

/// First non-empty termination message of a container that exited with 0
fn termination_message(pod: &Pod) -> Option<&str> {
    pod.status
        .iter()
        .flat_map(|s| s.container_statuses.iter().flatten())
        .filter_map(|status| status.state.as_ref()?.terminated.as_ref())
        .filter(|terminated| terminated.exit_code == 0)
        .find_map(|terminated| terminated.message.as_deref().filter(|m| !m.is_empty()))
}
