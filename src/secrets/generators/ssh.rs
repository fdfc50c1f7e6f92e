//! SSH private keys.

use super::{parse_params, GeneratedSecret, SECRET_TYPE_SSH_AUTH, SSH_AUTH_PRIVATE_KEY};
use crate::crd::SecretDescriptor;
use crate::crypto::{BlockingCrypto, KeyAlgorithm};
use crate::secrets::ResolveError;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SshParams {
    #[serde(default)]
    algorithm: Option<String>,
}

/// Seeded key, or a fresh key of `params.algorithm`
pub async fn generate(
    crypto: &BlockingCrypto,
    descriptor: &SecretDescriptor,
) -> Result<GeneratedSecret, ResolveError> {
    let mut secret =
        GeneratedSecret::seeded(SECRET_TYPE_SSH_AUTH, descriptor, &[SSH_AUTH_PRIVATE_KEY]);
    if secret.has(SSH_AUTH_PRIVATE_KEY) {
        return Ok(secret);
    }

    let params: SshParams = parse_params(descriptor)?;
    let algorithm: KeyAlgorithm = params.algorithm.as_deref().unwrap_or_default().parse()?;
    let key = crypto.generate_private_key(algorithm).await?;
    secret.set(SSH_AUTH_PRIVATE_KEY, key.as_bytes());
    Ok(secret)
}
