//! TLS certificates with optional CA chaining.
//!
//! Without `caSecret` a fresh self-signed CA is generated and stored next to
//! the leaf. With `caSecret` the CA material of that descriptor is used and
//! only the leaf certificate and key are stored.

use super::{
    parse_params, GeneratedSecret, CA_CERT_KEY, CA_KEY_KEY, SECRET_TYPE_TLS, TLS_CERT_KEY,
    TLS_PRIVATE_KEY_KEY,
};
use crate::crd::SecretDescriptor;
use crate::crypto::{BlockingCrypto, TlsParams, DEFAULT_CERT_VALIDITY_DAYS};
use crate::secrets::{ResolveError, ResolvedSecret};
use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::debug;
use zeroize::Zeroizing;

/// Where a leaf certificate gets its signing CA from
pub trait CaSource {
    /// Resolve another descriptor within the same pass
    fn resolve_ca<'r>(
        &'r mut self,
        name: &'r str,
    ) -> BoxFuture<'r, Result<ResolvedSecret, ResolveError>>;

    fn crypto(&self) -> &BlockingCrypto;
}

/// `params` of a TLS descriptor
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TlsDescriptorParams {
    #[serde(default)]
    algorithm: Option<String>,
    #[serde(default)]
    usage: Option<String>,
    #[serde(default)]
    common_name: Option<String>,
    #[serde(default)]
    organization: Vec<String>,
    #[serde(default)]
    sans: Vec<String>,
    #[serde(default)]
    duration_days: Option<u32>,
    #[serde(default)]
    ca_secret: Option<String>,
}

impl TlsDescriptorParams {
    /// Leaf parameters; the common name defaults to the first SAN, then the descriptor name
    fn leaf_params(&self, descriptor_name: &str) -> Result<TlsParams, ResolveError> {
        let common_name = self
            .common_name
            .clone()
            .filter(|cn| !cn.is_empty())
            .or_else(|| self.sans.first().cloned())
            .unwrap_or_else(|| descriptor_name.to_string());

        Ok(TlsParams {
            algorithm: self.algorithm.as_deref().unwrap_or_default().parse()?,
            usage: self.usage.as_deref().unwrap_or_default().parse()?,
            common_name,
            organization: self.organization.clone(),
            sans: self.sans.clone(),
            duration_days: self.duration_days.unwrap_or(DEFAULT_CERT_VALIDITY_DAYS),
        })
    }

    fn ca_secret(&self) -> Option<&str> {
        self.ca_secret.as_deref().filter(|s| !s.is_empty())
    }
}

/// CA certificate and key of a resolved CA descriptor
fn ca_material(
    ca_name: &str,
    ca: &ResolvedSecret,
) -> Result<(String, Zeroizing<String>), ResolveError> {
    match (ca.field_str(CA_CERT_KEY), ca.field_str(CA_KEY_KEY)) {
        (Some(cert), Some(key)) => Ok((cert.to_string(), Zeroizing::new(key.to_string()))),
        _ => Err(ResolveError::MissingCaMaterial(ca_name.to_string())),
    }
}

pub async fn generate<S: CaSource + Send>(
    source: &mut S,
    name: &str,
    descriptor: &SecretDescriptor,
) -> Result<GeneratedSecret, ResolveError> {
    let mut secret = GeneratedSecret::seeded(
        SECRET_TYPE_TLS,
        descriptor,
        &[TLS_CERT_KEY, TLS_PRIVATE_KEY_KEY, CA_CERT_KEY, CA_KEY_KEY],
    );
    if secret.has(TLS_CERT_KEY) && secret.has(TLS_PRIVATE_KEY_KEY) {
        return Ok(secret);
    }

    let params: TlsDescriptorParams = parse_params(descriptor)?;
    let leaf = params.leaf_params(name)?;
    let ca_secret = params.ca_secret();

    let (ca_cert, ca_key) = match (descriptor.seed(CA_CERT_KEY), descriptor.seed(CA_KEY_KEY)) {
        (Some(cert), Some(key)) => (cert.to_string(), Zeroizing::new(key.to_string())),
        _ => match ca_secret {
            None => {
                let ca = source.crypto().generate_ca(leaf.algorithm).await?;
                (ca.cert_pem, Zeroizing::new(ca.key_pem))
            }
            Some(ca_name) => {
                debug!("Resolving CA {} for {}", ca_name, name);
                let ca = source.resolve_ca(ca_name).await?;
                ca_material(ca_name, &ca)?
            }
        },
    };

    let issued = source
        .crypto()
        .generate_cert(&ca_cert, &ca_key, &leaf)
        .await?;
    let leaf_key = Zeroizing::new(issued.key_pem);
    secret.set(TLS_CERT_KEY, issued.cert_pem);
    secret.set(TLS_PRIVATE_KEY_KEY, leaf_key.as_bytes());
    if ca_secret.is_none() {
        secret.set(CA_CERT_KEY, ca_cert);
        secret.set(CA_KEY_KEY, ca_key.as_bytes());
    }

    Ok(secret)
}
