/// Structured error types for schedctl-core.
///
/// Business outcomes (rejections, not-found, successes) are *not* errors; they
/// travel as `Outcome`. This enum covers everything that stops a call from
/// producing an outcome at all.
use thiserror::Error;

use crate::model::{Operation, Role, ValidationError};

/// Main error type for schedule operations
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// No credentials row matched the supplied username/password
    #[error("authentication failed for user '{username}'")]
    AuthenticationFailed { username: String },

    /// Role policy refused the operation; no database call was made
    #[error("role '{role}' is not permitted to {operation}")]
    AuthorizationDenied { role: Role, operation: Operation },

    /// The database itself refused the statement (SQLSTATE 42501)
    #[error("database denied privilege: {0}")]
    PermissionDenied(String),

    /// Connection or protocol failure, including deadline expiry
    #[error("transport error: {0}")]
    Transport(String),

    /// A procedure returned a code outside its table
    #[error("{procedure} returned unexpected code {code}")]
    UnexpectedCode { procedure: &'static str, code: i32 },

    /// The credentials store holds a role this layer does not know
    #[error("credentials store returned unrecognized role '{0}'")]
    UnrecognizedRole(String),

    /// Malformed input rejected before reaching the database
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The lookup service credential was never initialized
    #[error("service credential is not configured")]
    NotConfigured,
}

/// Result type alias for schedule operations
pub type Result<T> = std::result::Result<T, ScheduleError>;

impl ScheduleError {
    /// Create a transport error from any displayable diagnostic
    pub fn transport(diagnostic: impl std::fmt::Display) -> Self {
        Self::Transport(diagnostic.to_string())
    }

    /// True when the failure happened below the business layer.
    ///
    /// A mutating call that fails this way may or may not have taken effect.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScheduleError::AuthorizationDenied {
            role: Role::Guest,
            operation: Operation::DropDatabase,
        };
        assert_eq!(err.to_string(), "role 'guest' is not permitted to dropDatabase");

        let err = ScheduleError::UnexpectedCode {
            procedure: "drop_database",
            code: 7,
        };
        assert_eq!(err.to_string(), "drop_database returned unexpected code 7");
    }

    #[test]
    fn test_validation_error_conversion() {
        let err: ScheduleError = ValidationError::Empty { field: "title" }.into();
        assert!(matches!(err, ScheduleError::Validation(_)));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_transport_keeps_diagnostic() {
        let err = ScheduleError::transport("connection refused");
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "transport error: connection refused");
    }
}
