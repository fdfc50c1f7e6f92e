//! Secrets derived from the output of a batch Job.
//!
//! `params.job` names the Job in the target namespace. `params.format`
//! selects how its output is interpreted:
//!
//! - `text`: the raw output is stored under `content`
//! - `json`: `{"type": "...", "data": {"key": "value"}}`, merged into the secret
//! - anything else: only the seed data is stored

use super::{parse_params, GeneratedSecret, CONTENT_KEY, SECRET_TYPE_OPAQUE};
use crate::crd::SecretDescriptor;
use crate::secrets::job_output::extract_job_output;
use crate::secrets::ResolveError;
use crate::store::ObjectStore;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobParams {
    #[serde(default)]
    job: Option<String>,
    #[serde(default)]
    format: Option<String>,
}

/// JSON document a job may print as its termination message
#[derive(Debug, Default, Deserialize)]
struct JobSecretOutput {
    #[serde(default, rename = "type")]
    secret_type: Option<String>,
    #[serde(default)]
    data: BTreeMap<String, String>,
}

pub async fn generate(
    store: &dyn ObjectStore,
    namespace: &str,
    descriptor: &SecretDescriptor,
) -> Result<GeneratedSecret, ResolveError> {
    let params: JobParams = parse_params(descriptor)?;
    let job_name = params
        .job
        .as_deref()
        .filter(|j| !j.is_empty())
        .ok_or(ResolveError::MissingJobParameter)?;

    let output = extract_job_output(store, namespace, job_name).await?;

    let mut secret = seeded_opaque(descriptor);
    apply_output(&mut secret, params.format.as_deref(), output)?;
    Ok(secret)
}

/// Every non-empty seed value, under its own key
fn seeded_opaque(descriptor: &SecretDescriptor) -> GeneratedSecret {
    let mut secret = GeneratedSecret {
        secret_type: SECRET_TYPE_OPAQUE.to_string(),
        data: BTreeMap::new(),
    };
    for key in descriptor.seed_data.keys() {
        if let Some(value) = descriptor.seed(key) {
            secret.set(key, value);
        }
    }
    secret
}

fn apply_output(
    secret: &mut GeneratedSecret,
    format: Option<&str>,
    output: Vec<u8>,
) -> Result<(), ResolveError> {
    match format {
        Some("text") => secret.set(CONTENT_KEY, output),
        Some("json") => {
            let parsed: JobSecretOutput = serde_json::from_slice(&output)
                .map_err(|e| ResolveError::InvalidJobOutput(e.to_string()))?;
            for (k, v) in parsed.data {
                secret.set(&k, v);
            }
            if let Some(secret_type) = parsed.secret_type.filter(|t| !t.is_empty()) {
                secret.secret_type = secret_type;
            }
        }
        _ => {}
    }
    Ok(())
}
