use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The request is valid but the current state refuses it.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures of the alert sound port. Never surfaced past the alert controller.
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Unsupported alert source: {0}")]
    Unsupported(String),
    #[error("Alert source unreachable: {0}")]
    Unreachable(String),
}
