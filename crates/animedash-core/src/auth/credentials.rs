use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};

use super::session::TOKEN_KEY;

/// Keychain service name
const SERVICE_NAME: &str = "animedash";

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Durable storage for the bearer token, keyed by a fixed name.
pub trait CredentialBackend: Send + Sync {
    /// Read the stored token. `Ok(None)` when nothing is stored.
    fn load(&self) -> Result<Option<String>>;

    /// Replace the stored token.
    fn store(&self, token: &str) -> Result<()>;

    /// Remove the stored token. Removing a missing token is not an error.
    fn remove(&self) -> Result<()>;

    /// Short name for logs and status output
    fn name(&self) -> &'static str;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: String,
    created_at: DateTime<Utc>,
}

/// Token persisted as JSON in the data directory.
pub struct FileBackend {
    data_dir: PathBuf,
}

impl FileBackend {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }
}

impl CredentialBackend for FileBackend {
    fn load(&self) -> Result<Option<String>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let stored: StoredToken =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(stored.token))
    }

    fn store(&self, token: &str) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir).context("Failed to create data directory")?;
        let stored = StoredToken {
            token: token.to_string(),
            created_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&stored)?;

        // Write then rename so readers never see a half-written file
        let tmp = self.data_dir.join(format!("{}.tmp", SESSION_FILE));
        std::fs::write(&tmp, contents).context("Failed to write session file")?;
        std::fs::rename(&tmp, self.session_path()).context("Failed to replace session file")?;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove session file")?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Token kept in the OS keychain.
pub struct KeyringBackend;

impl KeyringBackend {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, TOKEN_KEY).context("Failed to create keyring entry")
    }
}

impl CredentialBackend for KeyringBackend {
    fn load(&self) -> Result<Option<String>> {
        match Self::entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn store(&self, token: &str) -> Result<()> {
        Self::entry()?
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn remove(&self) -> Result<()> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }

    fn name(&self) -> &'static str {
        "keyring"
    }
}

/// Process-local storage, for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryBackend {
    token: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl CredentialBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.token.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn store(&self, token: &str) -> Result<()> {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
