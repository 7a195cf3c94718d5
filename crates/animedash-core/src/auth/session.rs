use std::fmt;
use std::sync::RwLock;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::credentials::CredentialBackend;

/// Fixed name the token is stored under
pub const TOKEN_KEY: &str = "token";

/// Reserved credential that authenticates the console locally, without the
/// backend ever verifying it.
pub const DEMO_TOKEN: &str = "demo-token";

/// Session lifecycle state, derived from the stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedInReal,
    LoggedInBypass,
}

impl SessionState {
    fn from_token(token: Option<&str>) -> Self {
        match token {
            None | Some("") => SessionState::LoggedOut,
            Some(DEMO_TOKEN) => SessionState::LoggedInBypass,
            Some(_) => SessionState::LoggedInReal,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::LoggedOut => "logged out",
            SessionState::LoggedInReal => "logged in",
            SessionState::LoggedInBypass => "logged in (demo mode)",
        };
        f.write_str(label)
    }
}

/// Holder of the bearer credential.
///
/// Every write replaces the whole value under one lock, so concurrent readers
/// see either the old or the new token, never a mix. Share it behind an `Arc`.
pub struct SessionStore {
    backend: Box<dyn CredentialBackend>,
    current: RwLock<Cached>,
}

/// In-process copy of the credential.
struct Cached {
    token: Option<String>,
    /// Storage may hold a token the cache does not: the load failed, or a
    /// previous clear could not reach the backend.
    storage_dirty: bool,
}

impl SessionStore {
    /// Open the store, reading whatever the backend already holds.
    ///
    /// A backend that fails to load is treated as holding nothing.
    pub fn open(backend: impl CredentialBackend + 'static) -> Self {
        Self::from_boxed(Box::new(backend))
    }

    pub fn from_boxed(backend: Box<dyn CredentialBackend>) -> Self {
        let (token, storage_dirty) = match backend.load() {
            Ok(token) => (token.filter(|t| !t.is_empty()), false),
            Err(e) => {
                warn!(backend = backend.name(), error = %e, "Failed to load stored credential");
                (None, true)
            }
        };
        debug!(
            backend = backend.name(),
            has_token = token.is_some(),
            "Session store opened"
        );
        Self {
            backend,
            current: RwLock::new(Cached {
                token,
                storage_dirty,
            }),
        }
    }

    /// Store a new credential, replacing any previous one. No format check is
    /// done. On a storage failure the previous credential stays in place.
    pub fn set_credential(&self, token: &str) -> Result<()> {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        self.backend.store(token)?;
        current.token = Some(token.to_string()).filter(|t| !t.is_empty());
        current.storage_dirty = false;
        info!(state = %SessionState::from_token(Some(token)), "Credential set");
        Ok(())
    }

    /// Current credential, if any.
    pub fn credential(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .token
            .clone()
    }

    /// Remove the credential. Clearing an absent credential is a no-op.
    ///
    /// The in-process session ends even when storage fails. If the backend
    /// cannot remove the token it is overwritten with an empty one, which
    /// reads back as logged out. An error means the old token may still be
    /// stored; the next clear tries again.
    pub fn clear_credential(&self) -> Result<()> {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        let had_token = current.token.take().is_some();
        if !had_token && !current.storage_dirty {
            return Ok(());
        }

        let outcome = self.backend.remove().or_else(|e| {
            warn!(
                backend = self.backend.name(),
                error = %e,
                "Failed to remove stored credential, blanking it"
            );
            self.backend
                .store("")
                .with_context(|| format!("Failed to remove stored credential: {:#}", e))
        });
        current.storage_dirty = outcome.is_err();
        if had_token {
            info!("Credential cleared");
        }
        outcome
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() != SessionState::LoggedOut
    }

    /// Whether the demo credential is in use.
    pub fn is_bypass_mode(&self) -> bool {
        self.state() == SessionState::LoggedInBypass
    }

    pub fn state(&self) -> SessionState {
        let current = self.current.read().unwrap_or_else(|e| e.into_inner());
        SessionState::from_token(current.token.as_deref())
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the token itself
        f.debug_struct("SessionStore")
            .field("backend", &self.backend.name())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::auth::MemoryBackend;

    struct BrokenBackend;

    impl CredentialBackend for BrokenBackend {
        fn load(&self) -> Result<Option<String>> {
            Err(anyhow::anyhow!("keychain locked"))
        }
        fn store(&self, _token: &str) -> Result<()> {
            Err(anyhow::anyhow!("keychain locked"))
        }
        fn remove(&self) -> Result<()> {
            Err(anyhow::anyhow!("keychain locked"))
        }
        fn name(&self) -> &'static str {
            "broken"
        }
    }

    /// Storage that outlives any one `SessionStore`, like a file or keychain
    /// seen by the next process. Individual operations can be made to fail.
    #[derive(Clone, Default)]
    struct SharedBackend {
        token: Arc<Mutex<Option<String>>>,
        removes: Arc<AtomicUsize>,
        fail_load: bool,
        fail_remove: bool,
    }

    impl SharedBackend {
        fn holding(token: &str) -> Self {
            let backend = Self::default();
            *backend.token.lock().unwrap() = Some(token.to_string());
            backend
        }

        fn stored(&self) -> Option<String> {
            self.token.lock().unwrap().clone()
        }
    }

    impl CredentialBackend for SharedBackend {
        fn load(&self) -> Result<Option<String>> {
            if self.fail_load {
                return Err(anyhow::anyhow!("keychain locked"));
            }
            Ok(self.stored())
        }
        fn store(&self, token: &str) -> Result<()> {
            *self.token.lock().unwrap() = Some(token.to_string());
            Ok(())
        }
        fn remove(&self) -> Result<()> {
            self.removes.fetch_add(1, Ordering::SeqCst);
            if self.fail_remove {
                return Err(anyhow::anyhow!("permission denied"));
            }
            *self.token.lock().unwrap() = None;
            Ok(())
        }
        fn name(&self) -> &'static str {
            "shared"
        }
    }

    #[test]
    fn test_round_trip() {
        let store = SessionStore::open(MemoryBackend::new());
        for token in ["abc123", "x", "ey.J0.k3n with spaces"] {
            store.set_credential(token).unwrap();
            assert_eq!(store.credential().as_deref(), Some(token));
        }
    }

    #[test]
    fn test_is_authenticated_follows_last_write() {
        let store = SessionStore::open(MemoryBackend::new());
        assert!(!store.is_authenticated());

        store.set_credential("abc123").unwrap();
        assert!(store.is_authenticated());

        store.clear_credential().unwrap();
        assert!(!store.is_authenticated());

        store.set_credential("").unwrap();
        assert!(!store.is_authenticated());

        store.set_credential("again").unwrap();
        store.set_credential("replaced").unwrap();
        assert!(store.is_authenticated());
        assert_eq!(store.credential().as_deref(), Some("replaced"));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = SessionStore::open(MemoryBackend::with_token("abc123"));
        store.clear_credential().unwrap();
        let once = (store.credential(), store.state());
        store.clear_credential().unwrap();
        assert_eq!((store.credential(), store.state()), once);
        assert_eq!(store.state(), SessionState::LoggedOut);
    }

    #[test]
    fn test_states() {
        let store = SessionStore::open(MemoryBackend::new());
        assert_eq!(store.state(), SessionState::LoggedOut);

        store.set_credential(DEMO_TOKEN).unwrap();
        assert_eq!(store.state(), SessionState::LoggedInBypass);
        assert!(store.is_bypass_mode());
        assert!(store.is_authenticated());

        store.set_credential("real-token").unwrap();
        assert_eq!(store.state(), SessionState::LoggedInReal);
        assert!(!store.is_bypass_mode());
    }

    #[test]
    fn test_open_reads_existing_token() {
        let store = SessionStore::open(MemoryBackend::with_token(DEMO_TOKEN));
        assert!(store.is_bypass_mode());
    }

    #[test]
    fn test_storage_errors_read_as_absent() {
        let store = SessionStore::open(BrokenBackend);
        assert_eq!(store.credential(), None);
        assert!(store.set_credential("abc123").is_err());
        assert_eq!(store.credential(), None);
        assert!(store.clear_credential().is_err());
        assert_eq!(store.state(), SessionState::LoggedOut);
    }

    #[test]
    fn test_failed_remove_blanks_stored_token() {
        let backend = SharedBackend {
            fail_remove: true,
            ..SharedBackend::default()
        };
        let store = SessionStore::open(backend.clone());
        store.set_credential("abc123").unwrap();

        store.clear_credential().unwrap();
        assert_eq!(store.credential(), None);
        assert_eq!(backend.stored().as_deref(), Some(""));

        let reopened = SessionStore::open(backend);
        assert_eq!(reopened.credential(), None);
        assert_eq!(reopened.state(), SessionState::LoggedOut);
    }

    #[test]
    fn test_clear_after_failed_load_reaches_storage() {
        let backend = SharedBackend {
            fail_load: true,
            ..SharedBackend::holding("abc123")
        };
        let store = SessionStore::open(backend.clone());
        assert_eq!(store.credential(), None);

        store.clear_credential().unwrap();
        assert_eq!(backend.stored(), None);
        assert_eq!(backend.removes.load(Ordering::SeqCst), 1);

        store.clear_credential().unwrap();
        assert_eq!(backend.removes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_without_token_skips_storage() {
        let backend = SharedBackend::default();
        let store = SessionStore::open(backend.clone());
        store.clear_credential().unwrap();
        assert_eq!(backend.removes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unclearable_storage_is_retried() {
        let store = SessionStore::open(BrokenBackend);
        assert!(store.clear_credential().is_err());
        // Still dirty, so the next clear tries the backend again
        let err = store.clear_credential().unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to remove stored credential"));
    }

    #[test]
    fn test_debug_hides_token() {
        let store = SessionStore::open(MemoryBackend::with_token("secret-value"));
        let printed = format!("{:?}", store);
        assert!(!printed.contains("secret-value"));
        assert!(printed.contains("LoggedInReal"));
    }
}
