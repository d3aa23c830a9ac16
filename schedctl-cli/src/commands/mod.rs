//! Command implementations for schedctl
//!
//! Every command except `completions` runs under a logged-in `Session`:
//! configuration is loaded, the lookup credential installed, and the caller's
//! credentials resolved to a role before the command body runs.

pub mod admin;
pub mod trainings;

use std::process::ExitCode;

use anyhow::{Context as _, Result};
use tracing::debug;

use schedctl_core::{Operation, Outcome, Session};
use schedctl_db::service::{self, ServiceGuard};
use schedctl_db::{PgScheduler, ServiceConfig};

use crate::render::{self, OutputFormat};

/// Logged-in state shared by the command bodies
pub struct Context {
    pub scheduler: PgScheduler,
    pub session: Session,
    pub format: OutputFormat,
    _service: ServiceGuard,
}

impl Context {
    pub async fn connect(
        config: &ServiceConfig,
        username: &str,
        password: &str,
        format: OutputFormat,
    ) -> Result<Self> {
        let credential = config
            .service_credential()
            .context("credentials lookup account is not configured")?;
        let guard = service::init(credential);

        let scheduler = schedctl_db::scheduler(config).context("invalid schedule configuration")?;
        debug!(target_db = %scheduler.target(), "scheduler ready");

        let session = scheduler
            .login(username, password)
            .await
            .context("login failed")?;

        Ok(Self {
            scheduler,
            session,
            format,
            _service: guard,
        })
    }

    /// Print an outcome; unsuccessful outcomes exit non-zero.
    pub fn report(&self, operation: Operation, outcome: schedctl_core::Result<Outcome>) -> Result<ExitCode> {
        let outcome = outcome.with_context(|| format!("{operation} failed"))?;
        println!("{}", render::render(self.format, operation, &outcome)?);
        Ok(if outcome.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }
}
