//! Username/password pairs.

use super::{
    GeneratedSecret, BASIC_AUTH_PASSWORD_KEY, BASIC_AUTH_USERNAME_KEY, SECRET_TYPE_BASIC_AUTH,
};
use crate::crd::SecretDescriptor;
use rand::Rng;
use zeroize::Zeroizing;

pub const USERNAME_LENGTH: usize = 8;
pub const PASSWORD_LENGTH: usize = 16;

const TOKEN_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Random lowercase alphanumeric token
pub fn random_token(length: usize) -> Zeroizing<String> {
    let mut rng = rand::thread_rng();
    Zeroizing::new(
        (0..length)
            .map(|_| {
                let idx = rng.gen_range(0..TOKEN_CHARSET.len());
                TOKEN_CHARSET[idx] as char
            })
            .collect(),
    )
}

/// Seeded credentials, with any missing field replaced by a random token
pub fn generate(descriptor: &SecretDescriptor) -> GeneratedSecret {
    let mut secret = GeneratedSecret::seeded(
        SECRET_TYPE_BASIC_AUTH,
        descriptor,
        &[BASIC_AUTH_USERNAME_KEY, BASIC_AUTH_PASSWORD_KEY],
    );
    for (key, length) in [
        (BASIC_AUTH_USERNAME_KEY, USERNAME_LENGTH),
        (BASIC_AUTH_PASSWORD_KEY, PASSWORD_LENGTH),
    ] {
        if !secret.has(key) {
            secret.set(key, random_token(length).as_bytes());
        }
    }
    secret
}
