//! Connection-per-call management
//!
//! No pool and no retry: every gateway call opens its own connection as the
//! acting identity and releases it before returning. A connection dropped
//! mid-call (cancelled future, early return) is closed by its destructor.

use std::future::Future;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use tracing::debug;

use schedctl_core::{Credentials, Result, ScheduleError};

use crate::config::ServiceConfig;

/// SQLSTATE for insufficient_privilege
const INSUFFICIENT_PRIVILEGE: &str = "42501";

/// Opens connections to the procedures database, bounded by a deadline.
#[derive(Debug, Clone)]
pub struct ConnectionProvider {
    host: String,
    port: u16,
    database: String,
    deadline: Duration,
}

impl ConnectionProvider {
    pub fn new(host: impl Into<String>, port: u16, database: impl Into<String>, deadline: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            deadline,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            config.database.host.clone(),
            config.database.port,
            config.database.name.clone(),
            config.call_timeout(),
        )
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    fn options(&self, credentials: &Credentials) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(credentials.username())
            .password(credentials.password().expose())
            .application_name("schedctl")
    }

    /// Open a connection with no deadline of its own; callers wrap the whole
    /// call in `within`.
    pub async fn connect(&self, credentials: &Credentials) -> Result<PgConnection> {
        debug!(
            host = %self.host,
            port = self.port,
            database = %self.database,
            user = credentials.username(),
            "opening connection"
        );
        PgConnection::connect_with(&self.options(credentials))
            .await
            .map_err(classify)
    }

    /// Run a whole call (connect, statement, release) under one deadline.
    ///
    /// On expiry the call future is dropped, which closes any connection it
    /// still holds.
    pub async fn within<T, F>(&self, label: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(ScheduleError::Transport(format!(
                "{} did not finish within {}s",
                label,
                self.deadline.as_secs()
            ))),
        }
    }

    /// Close a connection, logging rather than failing on close errors.
    pub async fn release(conn: PgConnection) {
        if let Err(e) = conn.close().await {
            debug!(error = %e, "connection close failed");
        }
    }
}

/// Map a driver error onto the schedule taxonomy.
///
/// A privilege refusal from the server is kept apart from transport failures;
/// everything else carries the driver's diagnostic text.
pub fn classify(err: sqlx::Error) -> ScheduleError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(INSUFFICIENT_PRIVILEGE) {
            return ScheduleError::PermissionDenied(db.message().to_owned());
        }
    }
    ScheduleError::transport(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(deadline: Duration) -> ConnectionProvider {
        ConnectionProvider::new("localhost", 5432, "trainings", deadline)
    }

    #[test]
    fn from_config_copies_settings() {
        let mut config = ServiceConfig::default();
        config.database.host = "pg.internal".into();
        config.call.timeout_secs = 4;

        let p = ConnectionProvider::from_config(&config);
        assert_eq!(p.host, "pg.internal");
        assert_eq!(p.database, "trainings");
        assert_eq!(p.deadline(), Duration::from_secs(4));
    }

    #[test]
    fn driver_errors_become_transport() {
        let err = classify(sqlx::Error::PoolTimedOut);
        assert!(err.is_transport());

        let err = classify(sqlx::Error::Protocol("unexpected message".into()));
        assert!(err.to_string().contains("unexpected message"));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expiry_is_transport() {
        let p = provider(Duration::from_secs(2));
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(1)
        };

        let err = p.within("add_new_training", slow).await.unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("add_new_training did not finish within 2s"));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_covers_every_step_of_a_call() {
        let p = provider(Duration::from_secs(2));
        let started = tokio::time::Instant::now();
        // Each step alone fits the deadline; together they do not
        let call = async {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            tokio::time::sleep(Duration::from_millis(1500)).await;
            Ok(())
        };

        let err = p.within("clear_database", call).await.unwrap_err();
        assert!(err.is_transport());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn fast_calls_pass_through() {
        let p = provider(Duration::from_secs(2));
        let value = p.within("noop", async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn inner_errors_pass_through() {
        let p = provider(Duration::from_secs(2));
        let err = p
            .within("noop", async { Err::<(), _>(ScheduleError::NotConfigured) })
            .await
            .unwrap_err();
        assert!(matches!(err, ScheduleError::NotConfigured));
    }

    #[tokio::test]
    async fn refused_connection_is_transport() {
        // Nothing listens on port 1; either refusal or the deadline ends the call
        let p = ConnectionProvider::new("127.0.0.1", 1, "trainings", Duration::from_secs(2));
        let credentials = Credentials::new("nobody", "nothing");
        let err = p
            .within("connect", p.connect(&credentials))
            .await
            .err()
            .expect("nothing should accept the connection");
        assert!(err.is_transport());
    }
}
