//! Docker registry credentials.

use super::{GeneratedSecret, DOCKER_CONFIG_JSON_KEY, SECRET_TYPE_DOCKER_CONFIG_JSON};
use crate::crd::SecretDescriptor;

/// Seeded registry config, or an empty `{}` config
pub fn generate(descriptor: &SecretDescriptor) -> GeneratedSecret {
    let mut secret = GeneratedSecret::seeded(
        SECRET_TYPE_DOCKER_CONFIG_JSON,
        descriptor,
        &[DOCKER_CONFIG_JSON_KEY],
    );
    if !secret.has(DOCKER_CONFIG_JSON_KEY) {
        secret.set(DOCKER_CONFIG_JSON_KEY, "{}");
    }
    secret
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::SecretType;

    #[test]
    fn test_defaults_to_empty_config() {
        let secret = generate(&SecretDescriptor::of_type(SecretType::Docker));
        assert_eq!(secret.data[DOCKER_CONFIG_JSON_KEY], b"{}");
        assert_eq!(secret.secret_type, SECRET_TYPE_DOCKER_CONFIG_JSON);
    }

    #[test]
    fn test_keeps_seeded_config() {
        let config = r#"{"auths":{"ghcr.io":{"auth":"dTpw"}}}"#;
        let secret = generate(
            &SecretDescriptor::of_type(SecretType::Docker).with_seed(DOCKER_CONFIG_JSON_KEY, config),
        );
        assert_eq!(secret.data[DOCKER_CONFIG_JSON_KEY], config.as_bytes());
    }
}
