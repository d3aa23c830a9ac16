//! Credentials and authenticated sessions

use std::fmt;

use serde::Serialize;

use super::Role;

/// A password that never shows up in logs or debug output
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value, for binding into a connection or query only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Username/password pair used to open a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: Secret,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Secret::new(password),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &Secret {
        &self.password
    }
}

/// Authenticated identity plus the role the credentials store assigned it.
///
/// Only `Scheduler::login` builds one, so a session's role always comes from
/// the store. Calls made under a session connect with the session's own
/// credentials.
#[derive(Debug, Clone)]
pub struct Session {
    credentials: Credentials,
    role: Role,
}

impl Session {
    pub(crate) fn establish(credentials: Credentials, role: Role) -> Self {
        Self { credentials, role }
    }

    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// Account to register through `create_user`.
///
/// The role stays free text: an unknown role must reach the procedure so it
/// can answer with its own code.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    #[serde(skip)]
    pub password: Secret,
    pub role: String,
}

impl NewUser {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: Secret::new(password),
            role: role.into(),
        }
    }
}
