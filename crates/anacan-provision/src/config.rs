//! Configuration loaded from a `.env` file and environment variables.
//!
//! The `.env` file in the working directory is read first; variables already
//! set in the process environment win. Every remote setting is also accepted
//! with the front end's `VITE_` prefix so the same file serves both.

use std::time::Duration;

use tracing::{debug, warn};

use anacan_shared::constants::{DEFAULT_DATABASE_ID, DEFAULT_ENDPOINT};

use crate::error::ConfigError;
use crate::retry::RetryPolicy;
use crate::settle::SettlePolicy;

/// Connection settings for the remote service.
#[derive(Clone)]
pub struct RemoteConfig {
    /// API endpoint, e.g. `https://cloud.appwrite.io/v1`.
    /// Env: `APPWRITE_ENDPOINT`
    pub endpoint: String,

    /// Env: `APPWRITE_PROJECT_ID`
    pub project_id: String,

    /// Env: `APPWRITE_DATABASE_ID`
    /// Default: `anacan`
    pub database_id: String,

    /// Server API key. Required by the provisioning tools, optional for
    /// read-only consumers of public collections.
    /// Env: `APPWRITE_API_KEY`
    pub api_key: Option<String>,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("database_id", &self.database_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl RemoteConfig {
    /// Build from a variable lookup. The API key is not checked here.
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let endpoint = var(lookup, "APPWRITE_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.into());
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidEndpoint(endpoint));
        }

        let project_id = var(lookup, "APPWRITE_PROJECT_ID").ok_or(ConfigError::MissingProjectId)?;
        let database_id =
            var(lookup, "APPWRITE_DATABASE_ID").unwrap_or_else(|| DEFAULT_DATABASE_ID.into());

        Ok(Self {
            endpoint,
            project_id,
            database_id,
            api_key: var(lookup, "APPWRITE_API_KEY"),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        load_env_file();
        Self::from_lookup(&|key| std::env::var(key).ok())
    }
}

/// Settings for the provisioning and seeding tools.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    pub remote: RemoteConfig,

    /// Env: `PROVISION_MAX_ATTEMPTS`, `PROVISION_RETRY_BASE_MS`,
    /// `PROVISION_RETRY_MAX_MS`, `PROVISION_JITTER_MS`
    pub retry: RetryPolicy,

    /// Env: `PROVISION_SETTLE_MS`, `PROVISION_POLL_READINESS` (true/false)
    pub settle: SettlePolicy,
}

impl ProvisionConfig {
    /// Load `.env`, then read the environment. Fails when no API key is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_env_file();
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if var(lookup, "APPWRITE_API_KEY").is_none() {
            return Err(ConfigError::MissingApiKey);
        }
        let remote = RemoteConfig::from_lookup(lookup)?;

        let mut retry = RetryPolicy::default();
        if let Some(n) = parse(lookup, "PROVISION_MAX_ATTEMPTS") {
            match u32::try_from(n) {
                Ok(n) => retry.max_attempts = n.max(1),
                Err(_) => warn!(value = n, "PROVISION_MAX_ATTEMPTS out of range, using default"),
            }
        }
        if let Some(ms) = parse(lookup, "PROVISION_RETRY_BASE_MS") {
            retry.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse(lookup, "PROVISION_RETRY_MAX_MS") {
            retry.max_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse(lookup, "PROVISION_JITTER_MS") {
            retry.jitter = Duration::from_millis(ms);
        }

        let mut settle = SettlePolicy::default();
        if let Some(ms) = parse(lookup, "PROVISION_SETTLE_MS") {
            settle.delay = Duration::from_millis(ms);
        }
        if let Some(val) = lookup("PROVISION_POLL_READINESS") {
            settle.poll = val != "false" && val != "0";
        }

        Ok(Self {
            remote,
            retry,
            settle,
        })
    }
}

/// Read `.env` from the working directory, if there is one.
pub fn load_env_file() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded environment file"),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!(error = %e, "Failed to read .env file"),
    }
}

/// Look up `key`, then `VITE_key`. Empty values count as unset.
fn var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .or_else(|| lookup(&format!("VITE_{key}")))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!(key, value = %raw, "Invalid number, using default");
            None
        }
    }
}
