//! App Secrets Controller Library
//!
//! Resolves, generates and projects the secrets declared by `Application`
//! resources. The secrets engine runs against the `ObjectStore` and
//! `CryptoProvider` seams, so everything below the runtime can be driven by
//! `MemoryStore` in tests.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod crypto;
pub mod observability;
pub mod runtime;
pub mod secrets;
pub mod store;
