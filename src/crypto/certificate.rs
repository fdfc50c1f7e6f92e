//! # Certificate Inspection
//!
//! Parse PEM certificates and verify issuer signatures.

use crate::crypto::{CryptoError, KeyAlgorithm};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::GeneralName;
use x509_parser::oid_registry::{
    OID_KEY_TYPE_EC_PUBLIC_KEY, OID_PKCS1_RSAENCRYPTION, OID_SIG_ED25519,
};
use x509_parser::pem::{parse_x509_pem, Pem};

/// Fields of a parsed certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    pub common_name: Option<String>,
    pub organization: Vec<String>,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
    /// `None` for key types not produced by this crate
    pub key_algorithm: Option<KeyAlgorithm>,
    pub is_ca: bool,
    /// Unix timestamp
    pub not_before: i64,
    /// Unix timestamp
    pub not_after: i64,
}

fn decode_pem(cert_pem: &str) -> Result<Pem, CryptoError> {
    let (_, pem) = parse_x509_pem(cert_pem.as_bytes())
        .map_err(|e| CryptoError::Parse(format!("failed to parse PEM: {e}")))?;
    Ok(pem)
}

fn decode_certificate(pem: &Pem) -> Result<X509Certificate<'_>, CryptoError> {
    pem.parse_x509()
        .map_err(|e| CryptoError::Parse(format!("failed to parse certificate: {e}")))
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().ok()?;
            Some(IpAddr::V4(Ipv4Addr::from(octets)))
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().ok()?;
            Some(IpAddr::V6(Ipv6Addr::from(octets)))
        }
        _ => None,
    }
}

/// Parse a PEM certificate
pub fn parse_certificate(cert_pem: &str) -> Result<CertificateInfo, CryptoError> {
    let pem = decode_pem(cert_pem)?;
    let cert = decode_certificate(&pem)?;

    let common_name = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string);
    let organization = cert
        .subject()
        .iter_organization()
        .filter_map(|o| o.as_str().ok())
        .map(str::to_string)
        .collect();

    let mut dns_names = Vec::new();
    let mut ip_addresses = Vec::new();
    let san = cert
        .subject_alternative_name()
        .map_err(|e| CryptoError::Parse(format!("invalid subjectAltName: {e}")))?;
    if let Some(san) = san {
        for name in &san.value.general_names {
            match name {
                GeneralName::DNSName(dns) => dns_names.push((*dns).to_string()),
                GeneralName::IPAddress(bytes) => ip_addresses.extend(ip_from_bytes(bytes)),
                _ => {}
            }
        }
    }

    let key_oid = &cert.public_key().algorithm.algorithm;
    let key_algorithm = if *key_oid == OID_PKCS1_RSAENCRYPTION {
        Some(KeyAlgorithm::Rsa)
    } else if *key_oid == OID_KEY_TYPE_EC_PUBLIC_KEY {
        Some(KeyAlgorithm::Ecdsa)
    } else if *key_oid == OID_SIG_ED25519 {
        Some(KeyAlgorithm::Ed25519)
    } else {
        None
    };

    Ok(CertificateInfo {
        common_name,
        organization,
        dns_names,
        ip_addresses,
        key_algorithm,
        is_ca: cert.is_ca(),
        not_before: cert.validity().not_before.timestamp(),
        not_after: cert.validity().not_after.timestamp(),
    })
}

/// Whether `cert_pem` was issued and signed by `ca_cert_pem`
pub fn verify_issued_by(cert_pem: &str, ca_cert_pem: &str) -> Result<bool, CryptoError> {
    let cert_pem = decode_pem(cert_pem)?;
    let cert = decode_certificate(&cert_pem)?;
    let ca_pem = decode_pem(ca_cert_pem)?;
    let ca = decode_certificate(&ca_pem)?;

    if cert.issuer().as_raw() != ca.subject().as_raw() {
        return Ok(false);
    }
    Ok(cert.verify_signature(Some(ca.public_key())).is_ok())
}
