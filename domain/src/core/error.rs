//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Field name not valid: {0}")]
    MalformedFieldName(String),

    #[error("Field conflicts with another field at the same path: {0}")]
    ConflictingField(String),

    #[error("Unknown task type: {0}")]
    UnknownTaskType(String),

    #[error("Task type already registered: {0}")]
    DuplicateTaskType(String),

    #[error("Unknown verifier kind: {0}")]
    UnknownVerifier(String),

    #[error("Invalid task state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

impl DomainError {
    /// Errors caused by a bad submission, scoped to that submission only
    pub fn is_submission_error(&self) -> bool {
        matches!(
            self,
            DomainError::MalformedFieldName(_) | DomainError::ConflictingField(_)
        )
    }

    /// Errors caused by missing or inconsistent registration at startup
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            DomainError::UnknownTaskType(_)
                | DomainError::DuplicateTaskType(_)
                | DomainError::UnknownVerifier(_)
        )
    }
}
