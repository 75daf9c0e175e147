// Central Error Type for the Application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Classification reported to callers at every boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::Conflict => write!(f, "conflict"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Domain(e) => e.kind(),
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::InvalidState(_) | AppError::Database(_) | AppError::Config(_) => {
                ErrorKind::Internal
            }
        }
    }
}

// Note: sqlx::Error conversion is handled in infra-sqlite crate
// by converting to AppError::Database(String)

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn test_domain_errors_classify_as_conflict_or_validation() {
        let transition: AppError = DomainError::InvalidStateTransition {
            from: "COMPLETED".to_string(),
            to: "CANCELLED".to_string(),
        }
        .into();
        assert_eq!(transition.kind(), ErrorKind::Conflict);

        let malformed: AppError = DomainError::Validation("bad".to_string()).into();
        assert_eq!(malformed.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_infrastructure_errors_are_internal() {
        assert_eq!(
            AppError::Database("locked".to_string()).kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            AppError::InvalidState("negative sequence".to_string()).kind(),
            ErrorKind::Internal
        );
        assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
    }
}
