//! schedctl-db: PostgreSQL side of the training schedule access layer
//!
//! - `connection`: one connection per call, bounded by a deadline
//! - `gateway`: stored procedure bindings (`PgGateway`)
//! - `auth`: parameterized credentials lookup (`PgAuthenticator`)
//! - `service`: process-wide lookup credential with explicit init/teardown
//! - `config`: `.env` + TOML + environment configuration

pub mod auth;
pub mod config;
pub mod connection;
pub mod error;
pub mod gateway;
pub mod rows;
pub mod service;

pub use auth::PgAuthenticator;
pub use config::ServiceConfig;
pub use connection::ConnectionProvider;
pub use error::DbError;
pub use gateway::PgGateway;

use schedctl_core::Scheduler;

/// Scheduler wired to PostgreSQL
pub type PgScheduler = Scheduler<PgGateway, PgAuthenticator>;

/// Build a scheduler from configuration.
///
/// The service credential must already be initialized via `service::init`
/// before the first login.
pub fn scheduler(config: &ServiceConfig) -> Result<PgScheduler, DbError> {
    let provider = ConnectionProvider::from_config(config);
    let target = config.target_database()?;
    Ok(Scheduler::new(
        PgGateway::new(provider.clone()),
        PgAuthenticator::new(provider),
        target,
    ))
}
