use std::path::PathBuf;
use std::time::Duration;

use crate::api::AdminCredentials;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local job service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the job service (default: `http://127.0.0.1:7799`).
    pub api_url: String,
    /// Period of the client status poll (default: `10` seconds).
    pub poll_interval: Duration,
    /// Period of the operator console refresh (default: `15` seconds).
    pub admin_refresh_interval: Duration,
    /// Per-request HTTP timeout (default: `30` seconds).
    pub request_timeout: Duration,
    /// File backing the identity cookie (default: `.miimine/cookies.json`).
    pub cookie_jar: PathBuf,
    /// Basic-auth credentials for admin endpoints, when both are set.
    pub admin: Option<AdminCredentials>,
}

/// A configuration value could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidSeconds { name: &'static str, value: String },
}

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:7799";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_ADMIN_REFRESH_SECS: u64 = 15;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_COOKIE_JAR: &str = ".miimine/cookies.json";

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            admin_refresh_interval: Duration::from_secs(DEFAULT_ADMIN_REFRESH_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            cookie_jar: PathBuf::from(DEFAULT_COOKIE_JAR),
            admin: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                  |
    /// |--------------------------------|--------------------------|
    /// | `MIIMINE_API_URL`              | `http://127.0.0.1:7799`  |
    /// | `MIIMINE_POLL_INTERVAL_SECS`   | `10`                     |
    /// | `MIIMINE_ADMIN_REFRESH_SECS`   | `15`                     |
    /// | `MIIMINE_REQUEST_TIMEOUT_SECS` | `30`                     |
    /// | `MIIMINE_COOKIE_JAR`           | `.miimine/cookies.json`  |
    /// | `ADMIN_USER` / `ADMIN_PASS`    | unset                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let secs = |name: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            match lookup(name) {
                None => Ok(default),
                Some(value) => match value.trim().parse::<u64>() {
                    Ok(n) if n > 0 => Ok(Duration::from_secs(n)),
                    _ => Err(ConfigError::InvalidSeconds { name, value }),
                },
            }
        };

        let admin = match (lookup("ADMIN_USER"), lookup("ADMIN_PASS")) {
            (Some(user), Some(password)) => Some(AdminCredentials { user, password }),
            _ => None,
        };

        Ok(Self {
            api_url: lookup("MIIMINE_API_URL")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.api_url),
            poll_interval: secs("MIIMINE_POLL_INTERVAL_SECS", defaults.poll_interval)?,
            admin_refresh_interval: secs(
                "MIIMINE_ADMIN_REFRESH_SECS",
                defaults.admin_refresh_interval,
            )?,
            request_timeout: secs("MIIMINE_REQUEST_TIMEOUT_SECS", defaults.request_timeout)?,
            cookie_jar: lookup("MIIMINE_COOKIE_JAR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.cookie_jar),
            admin,
        })
    }
}
