//! Application configuration management.
//!
//! This module handles loading and saving the console configuration: the
//! backend address, request timeout, where the credential is kept, and the
//! health polling interval.
//!
//! Configuration is stored at `~/.config/animedash/config.json`. Environment
//! variables override the file; command line flags override both.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::{CredentialBackend, FileBackend, KeyringBackend, MemoryBackend, SessionStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "animedash";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Health dashboard refresh interval in seconds.
const DEFAULT_HEALTH_POLL_SECS: u64 = 30;

pub const ENV_API_URL: &str = "ANIMEDASH_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "ANIMEDASH_TIMEOUT_SECS";
pub const ENV_CREDENTIAL_BACKEND: &str = "ANIMEDASH_CREDENTIAL_BACKEND";

/// Where the bearer token is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackendKind {
    #[default]
    File,
    Keyring,
    Memory,
}

impl FromStr for CredentialBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "keyring" | "keychain" => Ok(Self::Keyring),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow::anyhow!(
                "unknown credential backend '{}' (expected file, keyring or memory)",
                other
            )),
        }
    }
}

impl fmt::Display for CredentialBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::File => "file",
            Self::Keyring => "keyring",
            Self::Memory => "memory",
        };
        f.write_str(name)
    }
}

/// How the last login happened, kept for the status screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastLogin {
    pub method: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub credential_backend: CredentialBackendKind,
    pub health_poll_secs: u64,
    pub last_login: Option<LastLogin>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            credential_backend: CredentialBackendKind::default(),
            health_poll_secs: DEFAULT_HEALTH_POLL_SECS,
            last_login: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Ok(serde_json::from_str(&contents).context("Failed to parse config file")?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Apply environment overrides. Unparseable values are ignored with a warning.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => warn!(value = %raw, "Ignoring invalid {}", ENV_TIMEOUT_SECS),
            }
        }
        if let Some(raw) = lookup(ENV_CREDENTIAL_BACKEND) {
            match raw.parse() {
                Ok(kind) => self.credential_backend = kind,
                Err(e) => warn!(error = %e, "Ignoring invalid {}", ENV_CREDENTIAL_BACKEND),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn health_poll_interval(&self) -> Duration {
        Duration::from_secs(self.health_poll_secs.max(1))
    }

    fn credential_backend(&self) -> Result<Box<dyn CredentialBackend>> {
        let backend: Box<dyn CredentialBackend> = match self.credential_backend {
            CredentialBackendKind::File => Box::new(FileBackend::new(Self::data_dir()?)),
            CredentialBackendKind::Keyring => Box::new(KeyringBackend),
            CredentialBackendKind::Memory => Box::new(MemoryBackend::new()),
        };
        Ok(backend)
    }

    /// Open the session store on the configured backend.
    pub fn open_session(&self) -> Result<SessionStore> {
        Ok(SessionStore::from_boxed(self.credential_backend()?))
    }

    pub fn record_login(&mut self, method: &str) {
        self.last_login = Some(LastLogin {
            method: method.to_string(),
            at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:8000/api");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.health_poll_interval(), Duration::from_secs(30));
        assert_eq!(config.credential_backend, CredentialBackendKind::File);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"api_base_url":"https://api.example"}"#)
            .expect("Failed to parse config");
        assert_eq!(config.api_base_url, "https://api.example");
        assert_eq!(config.health_poll_secs, 30);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "https://staging.example/api"),
            (ENV_TIMEOUT_SECS, "5"),
            (ENV_CREDENTIAL_BACKEND, "keyring"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_base_url, "https://staging.example/api");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.credential_backend, CredentialBackendKind::Keyring);
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|k| match k {
            ENV_TIMEOUT_SECS => Some("soon".to_string()),
            ENV_CREDENTIAL_BACKEND => Some("vault".to_string()),
            _ => None,
        });
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!(
            "Keychain".parse::<CredentialBackendKind>().unwrap(),
            CredentialBackendKind::Keyring
        );
        assert!("vault".parse::<CredentialBackendKind>().is_err());
    }
}
