//! Credentials lookup against the `users` table

use async_trait::async_trait;
use tracing::debug;

use schedctl_core::{Authenticator, Result, Role, ScheduleError};

use crate::connection::{classify, ConnectionProvider};
use crate::service;

const LOOKUP_SQL: &str = "SELECT role FROM users WHERE username = $1 AND password = $2";

/// Resolves roles through the service credential installed by `service::init`.
#[derive(Debug, Clone)]
pub struct PgAuthenticator {
    provider: ConnectionProvider,
}

impl PgAuthenticator {
    pub fn new(provider: ConnectionProvider) -> Self {
        Self { provider }
    }
}

/// Map the stored role text; anything but an exact known role is an error.
pub fn stored_role(text: Option<String>) -> Result<Option<Role>> {
    match text {
        None => Ok(None),
        Some(text) => text
            .parse::<Role>()
            .map(Some)
            .map_err(|_| ScheduleError::UnrecognizedRole(text)),
    }
}

#[async_trait]
impl Authenticator for PgAuthenticator {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<Role>> {
        let service = service::current()?;
        let call = async {
            let mut conn = self.provider.connect(&service).await?;
            let found = sqlx::query_scalar::<_, String>(LOOKUP_SQL)
                .bind(username)
                .bind(password)
                .fetch_optional(&mut conn)
                .await
                .map_err(classify);
            ConnectionProvider::release(conn).await;
            found
        };
        let found = self.provider.within("credentials lookup", call).await?;

        debug!(user = username, matched = found.is_some(), "credentials lookup");
        stored_role(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_parameterized() {
        assert!(LOOKUP_SQL.contains("username = $1"));
        assert!(LOOKUP_SQL.contains("password = $2"));
        assert!(!LOOKUP_SQL.contains('\''));
    }

    #[test]
    fn stored_roles() {
        assert_eq!(stored_role(None).unwrap(), None);
        assert_eq!(stored_role(Some("admin".into())).unwrap(), Some(Role::Admin));
        assert_eq!(stored_role(Some("guest".into())).unwrap(), Some(Role::Guest));

        let err = stored_role(Some("Admin".into())).unwrap_err();
        assert!(matches!(err, ScheduleError::UnrecognizedRole(ref r) if r == "Admin"));
        assert!(stored_role(Some("superuser".into())).is_err());
    }
}
