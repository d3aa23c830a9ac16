//! Error types for schedctl-db setup
//!
//! Call-time failures use `schedctl_core::ScheduleError`; this covers what can
//! go wrong before the first call, while reading configuration.

use thiserror::Error;

use schedctl_core::ValidationError;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Error, Debug)]
pub enum DbError {
    /// A required setting has no value in any source
    #[error("missing setting: {0}")]
    MissingSetting(&'static str),

    /// A setting has a value that cannot be used
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("invalid setting: {0}")]
    Validation(#[from] ValidationError),
}

impl DbError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            name,
            reason: reason.into(),
        }
    }
}
