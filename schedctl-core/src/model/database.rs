//! Target database name
//!
//! Every business procedure takes the target database as its first argument,
//! so the name is validated once here instead of at each call site.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// PostgreSQL truncates identifiers past this length
const MAX_DATABASE_NAME_LEN: usize = 63;

/// Unquoted PostgreSQL identifier, lowercase
static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("invalid identifier regex"));

/// Validated name of the database that holds the `trainings` table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatabaseName(String);

impl DatabaseName {
    /// Name used when nothing else is configured
    pub const DEFAULT: &'static str = "training_schedule";

    /// Create a database name, validating identifier format.
    ///
    /// # Example
    /// ```
    /// use schedctl_core::DatabaseName;
    ///
    /// assert!(DatabaseName::new("training_schedule").is_ok());
    /// assert!(DatabaseName::new("Training").is_err());  // uppercase
    /// assert!(DatabaseName::new("x; drop").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty {
                field: "database name",
            });
        }

        if s.len() > MAX_DATABASE_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "database name",
                max: MAX_DATABASE_NAME_LEN,
            });
        }

        if !IDENT_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "database name",
                reason: "must be lowercase letters, digits and underscores, not starting with a digit",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DatabaseName {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl AsRef<str> for DatabaseName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DatabaseName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<DatabaseName> for String {
    fn from(name: DatabaseName) -> Self {
        name.0
    }
}
