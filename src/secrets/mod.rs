//! # Secrets Engine
//!
//! Resolves, generates and projects the secrets an Application declares.
//!
//! ## Module Structure
//!
//! - `engine.rs` - Processing order and outcome aggregation (`reconcile_secrets`)
//! - `resolver.rs` - Cache, binding, storage lookup and generation for one descriptor
//! - `generators/` - Per-type generators
//! - `job_output.rs` - Payload extraction from finished Jobs
//! - `projection.rs` - Consumer-facing copies in the target namespace
//! - `cache.rs` - Pass-scoped cache and `ResolvedSecret`
//! - `identity.rs` - Application identity
//! - `labels.rs` - Storage and projection labels
//! - `error.rs` - `ResolveError` and its classification

mod cache;
mod engine;
mod error;
pub mod generators;
mod identity;
pub mod job_output;
pub mod labels;
mod projection;
mod resolver;

pub use cache::{PassCache, ResolvedSecret};
pub use engine::{
    aggregate_message, ordered_descriptors, reconcile_secrets, SecretOutcome, SecretsCondition,
    SecretsReport,
};
pub use error::{ErrorClass, ResolveError};
pub use identity::AppIdentity;
pub use projection::{emit_projections, EmitSummary, Projection};
pub use resolver::Resolver;
