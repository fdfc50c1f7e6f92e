//! # Resolution Errors
//!
//! Errors raised while resolving a descriptor, and their classification into
//! the three outcome tiers the engine acts on.

use crate::crypto::CryptoError;
use crate::store::StoreError;
use thiserror::Error;

/// How the engine treats an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The object does not exist; missing or skipped depending on `optional`
    Absent,
    /// Aborts the whole pass
    Fatal,
    /// Recorded as an errored descriptor; the pass continues
    Generator,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Also raised when a succeeded job has no pods left
    #[error("{kind} \"{name}\" not found")]
    NotFound { kind: &'static str, name: String },

    #[error("bound secret {namespace}/{secret} for \"{descriptor}\" not found")]
    BindingTargetMissing {
        descriptor: String,
        namespace: String,
        secret: String,
    },

    #[error("object store error: {0}")]
    Store(StoreError),

    #[error("invalid application: {0}")]
    InvalidApplication(String),

    #[error("job not complete")]
    JobNotDone,

    #[error("job has no output")]
    JobNoOutput,

    #[error("invalid job: {0}")]
    InvalidJob(String),

    #[error("missing job parameter")]
    MissingJobParameter,

    #[error("invalid job output: {0}")]
    InvalidJobOutput(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("CA secret \"{0}\" has no CA material")]
    MissingCaMaterial(String),

    #[error("dependency cycle detected at \"{0}\"")]
    Cycle(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A failure already recorded earlier in the same pass
    #[error("{cause}")]
    Repeated { class: ErrorClass, cause: String },
}

impl ResolveError {
    pub fn not_found(kind: &'static str, name: &str) -> Self {
        ResolveError::NotFound {
            kind,
            name: name.to_string(),
        }
    }

    pub fn classify(&self) -> ErrorClass {
        match self {
            ResolveError::NotFound { .. } => ErrorClass::Absent,
            ResolveError::BindingTargetMissing { .. }
            | ResolveError::Store(_)
            | ResolveError::InvalidApplication(_) => ErrorClass::Fatal,
            ResolveError::JobNotDone
            | ResolveError::JobNoOutput
            | ResolveError::InvalidJob(_)
            | ResolveError::MissingJobParameter
            | ResolveError::InvalidJobOutput(_)
            | ResolveError::InvalidParams(_)
            | ResolveError::MissingCaMaterial(_)
            | ResolveError::Cycle(_)
            | ResolveError::Crypto(_) => ErrorClass::Generator,
            ResolveError::Repeated { class, .. } => *class,
        }
    }
}

impl From<StoreError> for ResolveError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, name, .. } => ResolveError::NotFound { kind, name },
            other if other.is_not_found() => ResolveError::NotFound {
                kind: "object",
                name: other.to_string(),
            },
            other => ResolveError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_absence_becomes_not_found() {
        let err: ResolveError = StoreError::not_found("secret", "apps", "db").into();
        assert_eq!(err.classify(), ErrorClass::Absent);
        assert_eq!(err.to_string(), "secret \"db\" not found");
    }

    #[test]
    fn test_store_fault_is_fatal() {
        let err: ResolveError = StoreError::Rejected {
            operation: "list secrets",
            reason: "forbidden".to_string(),
        }
        .into();
        assert_eq!(err.classify(), ErrorClass::Fatal);
    }

    #[test]
    fn test_generator_errors() {
        assert_eq!(ResolveError::JobNotDone.classify(), ErrorClass::Generator);
        assert_eq!(
            ResolveError::Cycle("tls".to_string()).classify(),
            ErrorClass::Generator
        );
        assert_eq!(ResolveError::JobNotDone.to_string(), "job not complete");
        assert_eq!(ResolveError::JobNoOutput.to_string(), "job has no output");
    }

    #[test]
    fn test_binding_target_missing_is_fatal() {
        let err = ResolveError::BindingTargetMissing {
            descriptor: "db".to_string(),
            namespace: "apps".to_string(),
            secret: "shared-db".to_string(),
        };
        assert_eq!(err.classify(), ErrorClass::Fatal);
    }
}
