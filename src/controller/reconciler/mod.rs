//! # Reconciler
//!
//! Reconciles Application resources.
//!
//! ## Module Structure
//!
//! - `types.rs` - `Reconciler` context, `ReconcilerError` and per-resource backoff state
//! - `validation.rs` - Application validation
//! - `reconcile.rs` - Main reconciliation pass
//! - `status.rs` - Status construction and updates

mod reconcile;
pub mod status;
mod types;
pub mod validation;

pub use reconcile::reconcile;
pub use types::{BackoffState, Reconciler, ReconcilerError};
