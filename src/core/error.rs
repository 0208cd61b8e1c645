//! Error types for dispatch operations.

use thiserror::Error;

use crate::core::lifecycle::RequestStatus;
use crate::util::serde::ResourceKind;

/// Errors produced by the dispatch core.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed or missing input.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Unknown hospital, request, ambulance or preference.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up.
        entity: &'static str,
        /// Identifier that missed.
        id: String,
    },
    /// Not enough free units to make the grant. The request stays pending.
    #[error("insufficient {kind}s: requested {requested}, available {available}")]
    UnsafeAllocation {
        /// First kind that fell short.
        kind: ResourceKind,
        /// Units requested of that kind.
        requested: u32,
        /// Units free at decision time.
        available: u32,
    },
    /// The lifecycle does not allow this move.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: RequestStatus,
        /// Requested status.
        to: RequestStatus,
    },
    /// Scheduling policy name is not one of the supported policies.
    #[error("unknown scheduling policy: {0}")]
    UnknownPolicy(String),
    /// Lost a serialization race; safe to retry.
    #[error("concurrent conflict: {0}")]
    ConcurrentConflict(String),
    /// Persistence collaborator failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl DispatchError {
    /// Shorthand for [`DispatchError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether the caller may retry the same call immediately.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentConflict(_))
    }

    /// Whether this is the recoverable "no resources currently available" case.
    #[must_use]
    pub const fn is_no_capacity(&self) -> bool {
        matches!(self, Self::UnsafeAllocation { .. })
    }

    /// Stable machine-readable kind, used by the API layer.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::UnsafeAllocation { .. } => "no_resources",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::UnknownPolicy(_) => "unknown_policy",
            Self::ConcurrentConflict(_) => "conflict",
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

/// Result alias for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
