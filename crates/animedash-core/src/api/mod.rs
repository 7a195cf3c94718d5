//! REST API client module for the catalog backend.
//!
//! This module provides the `ApiClient` for talking to the backend, the
//! middleware `Pipeline` every call passes through, and the local
//! `DemoBackend` used in demo mode.
//!
//! The API uses bearer token authentication. The token comes from the
//! `SessionStore` and is attached to every request once set.

pub mod client;
pub mod demo;
pub mod error;
pub mod pipeline;
pub mod transport;

pub use client::ApiClient;
pub use demo::DemoBackend;
pub use error::ApiError;
pub use pipeline::{AttachCredential, AuthFailurePolicy, Middleware, Pipeline, RequestLogger};
pub use transport::{HttpTransport, RawResponse, RequestEnvelope, Transport};
