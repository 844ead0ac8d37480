//! # Coordinator Error Types
//!
//! Domain error taxonomy for the release orchestration engine, split between
//! errors the engine itself raises (`CoordinatorError`) and errors surfaced
//! by the remote task-service protocol (`RemoteError`).

use thiserror::Error;

/// Result type for coordinator domain operations.
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Errors raised by the release/task state machines and the engine that
/// drives them.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("invalid transition: {entity} {id} cannot go {event} from {source}")]
    InvalidTransition {
        entity: &'static str,
        id: String,
        event: String,
        source: String,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("store error: {0}")]
    Store(String),

    #[error("remote task service error: {0}")]
    Remote(#[from] RemoteError),
}

impl CoordinatorError {
    pub fn invalid_transition(
        entity: &'static str,
        id: impl Into<String>,
        event: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self::InvalidTransition {
            entity,
            id: id.into(),
            event: event.into(),
            source: source.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Invalid transitions are programmer/caller errors, never worth retrying.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            CoordinatorError::Remote(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

/// Result type for calls to a remote task service.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors from the outbound `/status` and `/tasks` protocol (spec §4.5/§6).
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("task service returned non-2xx status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response body: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Every remote failure cancels the owning release (spec §7); this helper
    /// exists for symmetry with the teacher's `ClientError::is_recoverable`
    /// and for callers that want to distinguish connectivity problems from a
    /// decode bug worth fixing in code.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RemoteError::Http(_) | RemoteError::Timeout { .. } | RemoteError::Status { .. }
        )
    }
}
