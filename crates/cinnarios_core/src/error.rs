//! crates/cinnarios_core/src/error.rs
//!
//! The error taxonomy surfaced by the core services. None of these are fatal:
//! callers turn them into a notification and stay on the current screen.

/// Errors returned by the core services.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Missing or mismatched form fields. Raised before any mutation.
    #[error("{0}")]
    Validation(String),

    /// Bad credentials or a failure of the identity service.
    #[error("{0}")]
    Auth(String),

    #[error("You are already registered for event {0}")]
    AlreadyRegistered(String),

    #[error("You are not registered for event {0}")]
    NotRegistered(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// An operation that needs a session was attempted without one.
    #[error("Please log in first")]
    NotAuthenticated,
}

/// A convenience type alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;
