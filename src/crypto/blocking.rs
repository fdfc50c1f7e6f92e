//! Key generation on tokio's blocking pool.

use super::{CertificatePair, CryptoError, CryptoProvider, KeyAlgorithm, TlsParams};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Shared `CryptoProvider` whose generation calls run off the async workers
///
/// RSA key generation takes long enough to stall every other reconcile
/// scheduled on the same worker thread.
#[derive(Clone)]
pub struct BlockingCrypto {
    provider: Arc<dyn CryptoProvider>,
}

impl std::fmt::Debug for BlockingCrypto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingCrypto").finish_non_exhaustive()
    }
}

impl BlockingCrypto {
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        Self { provider }
    }

    async fn run<T, F>(&self, work: F) -> Result<T, CryptoError>
    where
        F: FnOnce(&dyn CryptoProvider) -> Result<T, CryptoError> + Send + 'static,
        T: Send + 'static,
    {
        let provider = Arc::clone(&self.provider);
        tokio::task::spawn_blocking(move || work(provider.as_ref()))
            .await
            .map_err(|e| CryptoError::KeyGeneration(format!("generation task failed: {e}")))?
    }

    pub async fn generate_private_key(
        &self,
        algorithm: KeyAlgorithm,
    ) -> Result<Zeroizing<String>, CryptoError> {
        self.run(move |provider| provider.generate_private_key(algorithm).map(Zeroizing::new))
            .await
    }

    pub async fn generate_ca(&self, algorithm: KeyAlgorithm) -> Result<CertificatePair, CryptoError> {
        self.run(move |provider| provider.generate_ca(algorithm)).await
    }

    pub async fn generate_cert(
        &self,
        ca_cert_pem: &str,
        ca_key_pem: &str,
        params: &TlsParams,
    ) -> Result<CertificatePair, CryptoError> {
        let ca_cert_pem = ca_cert_pem.to_string();
        let ca_key_pem = Zeroizing::new(ca_key_pem.to_string());
        let params = params.clone();
        self.run(move |provider| provider.generate_cert(&ca_cert_pem, &ca_key_pem, &params))
            .await
    }
}
