use crate::units::Amount;
use thiserror::Error;

/// Errors returned by governance operations.
///
/// One taxonomy serves every component, so hosts can map outcomes onto
/// transport responses without per-module translation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Amount, available: Amount },

    #[error("Expired: {0}")]
    Expired(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Result alias used across the workspace.
pub type GovernanceResult<T> = Result<T, GovernanceError>;

impl GovernanceError {
    /// Whether retrying the same call, with no other state change, can
    /// succeed. Only collaborator outages qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GovernanceError::Network(_))
    }
}

impl From<hex::FromHexError> for GovernanceError {
    fn from(e: hex::FromHexError) -> Self {
        GovernanceError::InvalidInput(format!("invalid hex: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GovernanceError::NotFound("proposal 7".to_string());
        assert!(err.to_string().contains("Not found"));
        assert!(err.to_string().contains("proposal 7"));
    }

    #[test]
    fn test_insufficient_funds_fields() {
        let err = GovernanceError::InsufficientFunds {
            requested: 500,
            available: 120,
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("120"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(GovernanceError::Network("gateway down".to_string()).is_retryable());
        assert!(!GovernanceError::Internal("bad state".to_string()).is_retryable());
        assert!(!GovernanceError::InvalidInput("zero".to_string()).is_retryable());
    }
}
