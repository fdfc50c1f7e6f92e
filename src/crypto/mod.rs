//! # Crypto
//!
//! Key and certificate primitives consumed by the secret generators.
//!
//! - `provider.rs` - `RcgenCrypto`, the `CryptoProvider` built on `rcgen`
//! - `blocking.rs` - `BlockingCrypto`, running a provider on the blocking pool
//! - `certificate.rs` - Certificate parsing and issuer verification (`x509-parser`)

mod blocking;
mod certificate;
mod provider;

pub use blocking::BlockingCrypto;
pub use certificate::{parse_certificate, verify_issued_by, CertificateInfo};
pub use provider::RcgenCrypto;

use std::str::FromStr;
use thiserror::Error;

/// Validity period for generated certificate authorities (10 years)
pub const CA_VALIDITY_DAYS: u32 = 3650;

/// Default validity period for leaf certificates
pub const DEFAULT_CERT_VALIDITY_DAYS: u32 = 365;

/// Common name of generated certificate authorities
pub const CA_COMMON_NAME: &str = "app-secrets-ca";

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key generation failed: {0}")]
    KeyGeneration(String),
    #[error("certificate generation failed: {0}")]
    CertificateGeneration(String),
    #[error("certificate parsing error: {0}")]
    Parse(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Private key algorithm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// ECDSA P-256 with SHA-256
    #[default]
    Ecdsa,
    /// RSA 2048 with SHA-256
    Rsa,
    Ed25519,
}

impl KeyAlgorithm {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyAlgorithm::Ecdsa => "ecdsa",
            KeyAlgorithm::Rsa => "rsa",
            KeyAlgorithm::Ed25519 => "ed25519",
        }
    }
}

impl FromStr for KeyAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "ecdsa" | "ec" => Ok(KeyAlgorithm::Ecdsa),
            "rsa" => Ok(KeyAlgorithm::Rsa),
            "ed25519" => Ok(KeyAlgorithm::Ed25519),
            other => Err(CryptoError::InvalidParameter(format!(
                "unsupported key algorithm '{other}'"
            ))),
        }
    }
}

/// Intended use of a leaf certificate, mapped to its extended key usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CertUsage {
    #[default]
    Server,
    Client,
}

impl FromStr for CertUsage {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "server" => Ok(CertUsage::Server),
            "client" => Ok(CertUsage::Client),
            other => Err(CryptoError::InvalidParameter(format!(
                "unsupported certificate usage '{other}'"
            ))),
        }
    }
}

/// Parameters of a leaf certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsParams {
    pub algorithm: KeyAlgorithm,
    pub usage: CertUsage,
    pub common_name: String,
    pub organization: Vec<String>,
    /// IP addresses become IP SANs, anything else a DNS SAN
    pub sans: Vec<String>,
    pub duration_days: u32,
}

impl TlsParams {
    #[must_use]
    pub fn new(common_name: &str) -> Self {
        Self {
            algorithm: KeyAlgorithm::default(),
            usage: CertUsage::default(),
            common_name: common_name.to_string(),
            organization: Vec::new(),
            sans: Vec::new(),
            duration_days: DEFAULT_CERT_VALIDITY_DAYS,
        }
    }
}

/// PEM-encoded certificate and its private key
#[derive(Clone, PartialEq, Eq)]
pub struct CertificatePair {
    pub cert_pem: String,
    pub key_pem: String,
}

impl std::fmt::Debug for CertificatePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificatePair")
            .field("cert_pem", &self.cert_pem)
            .field("key_pem", &"<redacted>")
            .finish()
    }
}

/// Key and certificate generation
///
/// Calls are CPU-bound; async code reaches them through `BlockingCrypto`.
pub trait CryptoProvider: Send + Sync {
    /// PEM-encoded PKCS#8 private key
    fn generate_private_key(&self, algorithm: KeyAlgorithm) -> Result<String, CryptoError>;

    /// Fresh self-signed certificate authority
    fn generate_ca(&self, algorithm: KeyAlgorithm) -> Result<CertificatePair, CryptoError>;

    /// Leaf certificate signed by the given CA
    fn generate_cert(
        &self,
        ca_cert_pem: &str,
        ca_key_pem: &str,
        params: &TlsParams,
    ) -> Result<CertificatePair, CryptoError>;

    fn parse_cert(&self, cert_pem: &str) -> Result<CertificateInfo, CryptoError> {
        parse_certificate(cert_pem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_algorithm_parsing() {
        assert_eq!("".parse::<KeyAlgorithm>().unwrap(), KeyAlgorithm::Ecdsa);
        assert_eq!("RSA".parse::<KeyAlgorithm>().unwrap(), KeyAlgorithm::Rsa);
        assert_eq!(
            "ed25519".parse::<KeyAlgorithm>().unwrap(),
            KeyAlgorithm::Ed25519
        );
        assert!("dsa".parse::<KeyAlgorithm>().is_err());
    }

    #[test]
    fn test_cert_usage_parsing() {
        assert_eq!("client".parse::<CertUsage>().unwrap(), CertUsage::Client);
        assert_eq!("".parse::<CertUsage>().unwrap(), CertUsage::Server);
        assert!("peer".parse::<CertUsage>().is_err());
    }

    #[test]
    fn test_certificate_pair_debug_redacts_key() {
        let pair = CertificatePair {
            cert_pem: "CERT".to_string(),
            key_pem: "SECRET".to_string(),
        };
        let rendered = format!("{pair:?}");
        assert!(rendered.contains("CERT"));
        assert!(!rendered.contains("SECRET"));
    }
}
