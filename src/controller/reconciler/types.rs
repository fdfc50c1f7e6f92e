//! # Types
//!
//! Core types for the reconciler.

use crate::config::ControllerConfig;
use crate::controller::backoff::FibonacciBackoff;
use crate::crypto::CryptoProvider;
use crate::secrets::ResolveError;
use crate::store::{ObjectStore, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Secret resolution aborted: {0}")]
    Secrets(#[from] ResolveError),
    #[error("Status update failed: {0}")]
    Status(#[source] StoreError),
}

/// Backoff state for a specific Application
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_minutes, max_minutes),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Shared reconciliation context
#[derive(Clone)]
pub struct Reconciler {
    pub store: Arc<dyn ObjectStore>,
    pub crypto: Arc<dyn CryptoProvider>,
    pub config: ControllerConfig,
    // Keyed by namespace/name; owned by the error policy
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        crypto: Arc<dyn CryptoProvider>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            store,
            crypto,
            config,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record a failure for `resource_key` and return the delay before the
    /// next attempt, in seconds, together with the consecutive error count
    pub fn next_error_backoff(&self, resource_key: &str) -> (u64, u32) {
        let mut states = self
            .backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let state = states
            .entry(resource_key.to_string())
            .or_insert_with(|| {
                BackoffState::new(
                    self.config.backoff_min_minutes,
                    self.config.backoff_max_minutes,
                )
            });
        state.increment_error();
        (state.backoff.next_backoff_seconds(), state.error_count)
    }

    /// Forget the failure history of `resource_key`
    pub fn reset_backoff(&self, resource_key: &str) {
        let mut states = self
            .backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        states.remove(resource_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::RcgenCrypto;
    use crate::store::MemoryStore;

    fn reconciler() -> Reconciler {
        Reconciler::new(
            Arc::new(MemoryStore::new()),
            Arc::new(RcgenCrypto),
            ControllerConfig::default(),
        )
    }

    #[test]
    fn test_backoff_is_tracked_per_resource() {
        let ctx = reconciler();
        assert_eq!(ctx.next_error_backoff("team-a/web"), (60, 1));
        assert_eq!(ctx.next_error_backoff("team-a/web"), (60, 2));
        assert_eq!(ctx.next_error_backoff("team-a/web"), (120, 3));
        assert_eq!(ctx.next_error_backoff("team-b/web"), (60, 1));
    }

    #[test]
    fn test_reset_backoff_starts_over() {
        let ctx = reconciler();
        for _ in 0..4 {
            ctx.next_error_backoff("team-a/web");
        }
        ctx.reset_backoff("team-a/web");
        assert_eq!(ctx.next_error_backoff("team-a/web"), (60, 1));
    }

    #[test]
    fn test_backoff_state_counts_errors() {
        let mut state = BackoffState::new(1, 10);
        state.increment_error();
        state.increment_error();
        assert_eq!(state.error_count, 2);
        state.reset();
        assert_eq!(state.error_count, 0);
    }
}
