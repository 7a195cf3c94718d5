//! Core library for animedash, the admin console for the anime catalog backend.
//!
//! - `auth`: the session store holding the bearer credential
//! - `api`: the gateway client, its middleware pipeline and the demo backend
//! - `models`: wire shapes exchanged with the backend
//! - `config`: console configuration
//! - `poller`: background health polling

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod poller;

pub use api::{ApiClient, ApiError};
pub use auth::{SessionState, SessionStore, DEMO_TOKEN};
pub use config::Config;
pub use poller::{HealthPoller, HealthSnapshot};
