//! Authentication module for holding the console's bearer credential.
//!
//! This module provides:
//! - `SessionStore`: the single source of truth for "are we logged in, and as what"
//! - `CredentialBackend`: durable client-local storage for the token, with
//!   file, OS keychain and in-memory implementations
//!
//! The credential is an opaque string. The reserved value `DEMO_TOKEN` puts the
//! console in demo (bypass) mode.

pub mod credentials;
pub mod session;

pub use credentials::{CredentialBackend, FileBackend, KeyringBackend, MemoryBackend};
pub use session::{SessionState, SessionStore, DEMO_TOKEN, TOKEN_KEY};
