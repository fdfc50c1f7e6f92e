//! # Custom Resource Definitions
//!
//! CRD types for the App Secrets Controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - `Application` CRD specification
//! - `secret.rs` - Secret descriptors, secret types and bindings
//! - `status.rs` - Status types for tracking reconciliation state

mod secret;
mod spec;
mod status;

// Re-export all public types
pub use secret::{SecretBinding, SecretDescriptor, SecretType};
pub use spec::{Application, ApplicationSpec};
pub use status::{ApplicationStatus, Condition, SecretPhase, SecretStatus};
