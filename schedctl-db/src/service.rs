//! Process-wide service credential for the credentials lookup
//!
//! Set once at startup with `init` and cleared with `teardown` (or when the
//! returned guard drops). Lookups before `init` fail with `NotConfigured`.

use std::sync::RwLock;

use tracing::{debug, info};

use schedctl_core::{Credentials, Result, ScheduleError};

static SERVICE_CREDENTIAL: RwLock<Option<Credentials>> = RwLock::new(None);

/// Clears the service credential when dropped.
#[must_use = "dropping the guard clears the service credential"]
pub struct ServiceGuard {
    _private: (),
}

impl Drop for ServiceGuard {
    fn drop(&mut self) {
        teardown();
    }
}

/// Install the credential used by `PgAuthenticator`, replacing any previous one.
pub fn init(credentials: Credentials) -> ServiceGuard {
    info!(user = credentials.username(), "service credential initialized");
    let mut slot = SERVICE_CREDENTIAL
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = Some(credentials);
    ServiceGuard { _private: () }
}

pub fn teardown() {
    let mut slot = SERVICE_CREDENTIAL
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if slot.take().is_some() {
        debug!("service credential cleared");
    }
}

/// Copy of the current credential, or `NotConfigured`.
pub fn current() -> Result<Credentials> {
    SERVICE_CREDENTIAL
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
        .ok_or(ScheduleError::NotConfigured)
}

pub fn is_initialized() -> bool {
    SERVICE_CREDENTIAL
        .read()
        .map(|slot| slot.is_some())
        .unwrap_or(false)
}
