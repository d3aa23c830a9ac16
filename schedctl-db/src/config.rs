//! Configuration: `.env` files, TOML files, then environment variables
//!
//! Priority (highest to lowest):
//! 1. Environment variables (`SCHEDCTL_*`)
//! 2. ./schedctl.toml (project-specific)
//! 3. ~/.schedctl/config.toml (user defaults)
//! 4. Built-in defaults
//!
//! The service password is accepted from the environment only, never from a
//! TOML file, so it does not end up in a checked-in config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use schedctl_core::{Credentials, DatabaseName, Secret};

use crate::error::{DbError, DbResult};

pub const ENV_DB_HOST: &str = "SCHEDCTL_DB_HOST";
pub const ENV_DB_PORT: &str = "SCHEDCTL_DB_PORT";
pub const ENV_DB_NAME: &str = "SCHEDCTL_DB_NAME";
pub const ENV_TARGET_DB: &str = "SCHEDCTL_TARGET_DB";
pub const ENV_CALL_TIMEOUT: &str = "SCHEDCTL_CALL_TIMEOUT_SECS";
pub const ENV_SERVICE_USER: &str = "SCHEDCTL_SERVICE_USER";
pub const ENV_SERVICE_PASSWORD: &str = "SCHEDCTL_SERVICE_PASSWORD";

/// Load environment variables from .env files
///
/// Checks ./.env first, then ~/.schedctl/.env. dotenvy never overwrites a
/// variable that is already set, so earlier sources win.
pub fn load_dotenv() -> Vec<PathBuf> {
    let mut loaded_from = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded .env from current directory: {}", path.display());
        loaded_from.push(path);
    }

    if let Some(env_file) = config_dir().map(|d| d.join(".env")) {
        if env_file.exists() {
            match dotenvy::from_path(&env_file) {
                Ok(()) => {
                    debug!("Loaded .env from {}", env_file.display());
                    loaded_from.push(env_file);
                }
                Err(e) => debug!("Failed to load {}: {}", env_file.display(), e),
            }
        }
    }

    if loaded_from.is_empty() {
        debug!("No .env files found (current dir or ~/.schedctl)");
    }
    loaded_from
}

/// The schedctl config directory (~/.schedctl)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".schedctl"))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub call: CallConfig,

    #[serde(default)]
    pub service: ServiceAccountConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Database holding the procedures and the `users` table
    #[serde(default = "default_connection_db")]
    pub name: String,

    /// Database the procedures operate on
    #[serde(default = "default_target_db")]
    pub target: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            name: default_connection_db(),
            target: default_target_db(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallConfig {
    /// Deadline for connecting plus executing one procedure
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Least-privilege account used only for the credentials lookup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceAccountConfig {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(skip)]
    pub password: Option<Secret>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_connection_db() -> String {
    "trainings".to_string()
}

fn default_target_db() -> String {
    DatabaseName::DEFAULT.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl ServiceConfig {
    /// Load defaults, TOML files and environment, in priority order.
    pub fn load() -> DbResult<Self> {
        let mut paths = Vec::new();
        if let Some(global) = config_dir().map(|d| d.join("config.toml")) {
            paths.push(global);
        }
        paths.push(PathBuf::from("schedctl.toml"));

        let mut config = Self::load_from_paths(&paths);
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Merge TOML files in order; later files override earlier ones key by key.
    ///
    /// Unreadable, unparsable or ill-typed files are skipped with a warning;
    /// the other files still apply.
    pub fn load_from_paths(paths: &[PathBuf]) -> Self {
        let mut merged = toml::Table::new();

        for path in paths.iter().filter(|p| p.exists()) {
            match read_table(path) {
                Ok(table) => {
                    debug!("Loaded config from {}", path.display());
                    merge_tables(&mut merged, table);
                }
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        match toml::Value::Table(merged).try_into::<ServiceConfig>() {
            Ok(config) => config,
            Err(e) => {
                warn!("Invalid config values, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Apply `SCHEDCTL_*` overrides from `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> DbResult<()> {
        if let Some(host) = lookup(ENV_DB_HOST) {
            self.database.host = host;
        }
        if let Some(port) = lookup(ENV_DB_PORT) {
            self.database.port = port
                .parse()
                .map_err(|_| DbError::invalid(ENV_DB_PORT, format!("'{port}' is not a port")))?;
        }
        if let Some(name) = lookup(ENV_DB_NAME) {
            self.database.name = name;
        }
        if let Some(target) = lookup(ENV_TARGET_DB) {
            self.database.target = target;
        }
        if let Some(secs) = lookup(ENV_CALL_TIMEOUT) {
            self.call.timeout_secs = secs.parse().map_err(|_| {
                DbError::invalid(ENV_CALL_TIMEOUT, format!("'{secs}' is not a whole number"))
            })?;
        }
        if let Some(user) = lookup(ENV_SERVICE_USER) {
            self.service.username = Some(user);
        }
        if let Some(password) = lookup(ENV_SERVICE_PASSWORD) {
            self.service.password = Some(Secret::new(password));
        }
        Ok(())
    }

    /// Per-call deadline, never below one second
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call.timeout_secs.max(1))
    }

    pub fn target_database(&self) -> DbResult<DatabaseName> {
        Ok(DatabaseName::new(&self.database.target)?)
    }

    /// Credential for the authentication lookup connection
    pub fn service_credential(&self) -> DbResult<Credentials> {
        let username = self
            .service
            .username
            .as_deref()
            .ok_or(DbError::MissingSetting(ENV_SERVICE_USER))?;
        let password = self
            .service
            .password
            .as_ref()
            .ok_or(DbError::MissingSetting(ENV_SERVICE_PASSWORD))?;

        info!(user = username, "using service account for credential lookups");
        Ok(Credentials::new(username, password.expose()))
    }
}

/// Read one config file, rejecting it whole if any value has the wrong type.
fn read_table(path: &Path) -> Result<toml::Table, String> {
    let contents = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let table = contents.parse::<toml::Table>().map_err(|e| e.to_string())?;
    toml::Value::Table(table.clone())
        .try_into::<ServiceConfig>()
        .map_err(|e| e.to_string())?;
    Ok(table)
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => merge_tables(existing, incoming),
                _ => {
                    base.insert(key, toml::Value::Table(incoming));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.name, "trainings");
        assert_eq!(config.database.target, "training_schedule");
        assert_eq!(config.call_timeout(), Duration::from_secs(10));
        assert!(config.service.username.is_none());
    }

    #[test]
    fn test_local_file_overrides_global_per_key() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.toml");
        let local = temp.path().join("local.toml");
        fs::write(
            &global,
            "[database]\nhost = \"db.internal\"\nport = 6543\n\n[service]\nusername = \"lookup\"\n",
        )
        .unwrap();
        fs::write(&local, "[database]\nport = 7000\n").unwrap();

        let config = ServiceConfig::load_from_paths(&[global, local]);
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 7000);
        assert_eq!(config.service.username.as_deref(), Some("lookup"));
    }

    #[test]
    fn test_missing_and_broken_files_fall_back() {
        let temp = TempDir::new().unwrap();
        let broken = temp.path().join("broken.toml");
        fs::write(&broken, "this is = = not toml").unwrap();

        let config =
            ServiceConfig::load_from_paths(&[temp.path().join("absent.toml"), broken]);
        assert_eq!(config.database.port, 5432);
    }

    #[test]
    fn test_ill_typed_local_file_keeps_global() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.toml");
        let local = temp.path().join("local.toml");
        fs::write(&global, "[database]\nhost = \"db.internal\"\n").unwrap();
        fs::write(&local, "[call]\ntimeout_secs = \"ten\"\n").unwrap();

        let config = ServiceConfig::load_from_paths(&[global, local]);
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.call_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_password_in_toml_is_ignored() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("config.toml");
        fs::write(&file, "[service]\nusername = \"lookup\"\npassword = \"leaked\"\n").unwrap();

        let config = ServiceConfig::load_from_paths(&[file]);
        assert!(config.service.password.is_none());
        assert!(matches!(
            config.service_credential(),
            Err(DbError::MissingSetting(ENV_SERVICE_PASSWORD))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServiceConfig::default();
        config
            .apply_env(env(&[
                (ENV_DB_HOST, "pg"),
                (ENV_DB_PORT, "5433"),
                (ENV_TARGET_DB, "gym"),
                (ENV_CALL_TIMEOUT, "3"),
                (ENV_SERVICE_USER, "lookup"),
                (ENV_SERVICE_PASSWORD, "pw"),
            ]))
            .unwrap();

        assert_eq!(config.database.host, "pg");
        assert_eq!(config.database.port, 5433);
        assert_eq!(config.target_database().unwrap().as_str(), "gym");
        assert_eq!(config.call_timeout(), Duration::from_secs(3));

        let creds = config.service_credential().unwrap();
        assert_eq!(creds.username(), "lookup");
        assert_eq!(creds.password().expose(), "pw");
    }

    #[test]
    fn test_bad_env_values() {
        let mut config = ServiceConfig::default();
        let err = config.apply_env(env(&[(ENV_DB_PORT, "http")])).unwrap_err();
        assert!(matches!(err, DbError::InvalidSetting { name: ENV_DB_PORT, .. }));

        let err = config
            .apply_env(env(&[(ENV_CALL_TIMEOUT, "-1")]))
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidSetting { name: ENV_CALL_TIMEOUT, .. }));
    }

    #[test]
    fn test_invalid_target_rejected() {
        let mut config = ServiceConfig::default();
        config.database.target = "Training Schedule".into();
        assert!(matches!(config.target_database(), Err(DbError::Validation(_))));
    }

    #[test]
    fn test_zero_timeout_clamped() {
        let mut config = ServiceConfig::default();
        config.call.timeout_secs = 0;
        assert_eq!(config.call_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_config_dir_returns_path() {
        if let Some(path) = config_dir() {
            assert!(path.ends_with(".schedctl"));
        }
    }
}
