use std::fmt::Display;
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::services::StoreError;

/// Failures surfaced by the directory and interest services
///
/// Raised where they are detected and passed to the caller unchanged.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("broker {caller} does not own {kind} {id}")]
    Forbidden {
        kind: &'static str,
        id: String,
        caller: Uuid,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl ServiceError {
    pub fn not_found(kind: &'static str, id: impl Display) -> Self {
        ServiceError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn forbidden(kind: &'static str, id: impl Display, caller: Uuid) -> Self {
        ServiceError::Forbidden {
            kind,
            id: id.to_string(),
            caller,
        }
    }

    /// Stable machine-readable code for the error body
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotFound { .. } => "not_found",
            ServiceError::Forbidden { .. } => "forbidden",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::InvalidOperation(_) => "invalid_operation",
            ServiceError::InvalidState(_) => "invalid_state",
            ServiceError::InvalidInput(_) => "invalid_input",
            ServiceError::Unauthenticated => "unauthenticated",
            ServiceError::Storage(_) => "storage_error",
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::InvalidInput(errors.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
