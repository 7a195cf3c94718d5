//! Middleware pipeline wrapped around a transport.
//!
//! Every backend call goes through `Pipeline::execute`. Request hooks run in
//! the order the layers were added; response hooks run in reverse. Non-2xx
//! statuses are turned into `ApiError`s before any response hook sees them.
//!
//! Hooks are synchronous and run to completion, so a credential cleared by
//! one response is visible to the next request that starts.

use std::sync::Arc;

use reqwest::header::{self, HeaderValue};
use tracing::{debug, warn};

use crate::auth::SessionStore;

use super::transport::{RawResponse, RequestEnvelope, Transport};
use super::ApiError;

pub trait Middleware: Send + Sync {
    fn on_request(&self, _request: &mut RequestEnvelope) -> Result<(), ApiError> {
        Ok(())
    }

    fn on_response(
        &self,
        _request: &RequestEnvelope,
        result: Result<RawResponse, ApiError>,
    ) -> Result<RawResponse, ApiError> {
        result
    }
}

#[derive(Clone)]
pub struct Pipeline {
    transport: Arc<dyn Transport>,
    layers: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            layers: Vec::new(),
        }
    }

    /// The standard stack: attach the credential, apply the 401 policy, log.
    pub fn standard(transport: Arc<dyn Transport>, session: Arc<SessionStore>) -> Self {
        Self::new(transport)
            .layer(AttachCredential::new(Arc::clone(&session)))
            .layer(AuthFailurePolicy::new(session))
            .layer(RequestLogger)
    }

    pub fn layer(mut self, middleware: impl Middleware + 'static) -> Self {
        self.layers.push(Arc::new(middleware));
        self
    }

    pub async fn execute(&self, mut request: RequestEnvelope) -> Result<RawResponse, ApiError> {
        for layer in &self.layers {
            layer.on_request(&mut request)?;
        }

        let mut result = self
            .transport
            .send(&request)
            .await
            .and_then(check_status);

        for layer in self.layers.iter().rev() {
            result = layer.on_response(&request, result);
        }
        result
    }
}

/// Turn a non-success status into a typed error.
fn check_status(response: RawResponse) -> Result<RawResponse, ApiError> {
    if response.status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::from_status(response.status, &response.text()))
    }
}

/// Outbound: sets `Authorization: Bearer <token>` when a credential is stored.
pub struct AttachCredential {
    session: Arc<SessionStore>,
}

impl AttachCredential {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }
}

impl Middleware for AttachCredential {
    fn on_request(&self, request: &mut RequestEnvelope) -> Result<(), ApiError> {
        request.headers.remove(header::AUTHORIZATION);
        if let Some(token) = self.session.credential().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidHeader)?;
            value.set_sensitive(true);
            request.headers.insert(header::AUTHORIZATION, value);
        }
        Ok(())
    }
}

/// Inbound: reacts to 401 responses.
///
/// With a real credential the session is cleared and `SessionExpired` is
/// returned for the shell to send the user back to login. In demo mode the
/// session is kept and the call fails with `Unauthorized`.
pub struct AuthFailurePolicy {
    session: Arc<SessionStore>,
}

impl AuthFailurePolicy {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }
}

impl Middleware for AuthFailurePolicy {
    fn on_response(
        &self,
        request: &RequestEnvelope,
        result: Result<RawResponse, ApiError>,
    ) -> Result<RawResponse, ApiError> {
        match result {
            Err(ApiError::SessionExpired) if self.session.is_bypass_mode() => {
                debug!(path = %request.path, "401 in demo mode, keeping session");
                Err(ApiError::Unauthorized)
            }
            Err(ApiError::SessionExpired) => {
                warn!(path = %request.path, "401 received, clearing session");
                if let Err(e) = self.session.clear_credential() {
                    warn!(error = ?e, "Stored credential survived the 401");
                }
                Err(ApiError::SessionExpired)
            }
            other => other,
        }
    }
}

/// Logs each request and its outcome. Never logs the credential.
pub struct RequestLogger;

impl Middleware for RequestLogger {
    fn on_request(&self, request: &mut RequestEnvelope) -> Result<(), ApiError> {
        debug!(
            method = %request.method,
            path = %request.path,
            has_token = request.headers.contains_key(header::AUTHORIZATION),
            "Sending request"
        );
        Ok(())
    }

    fn on_response(
        &self,
        request: &RequestEnvelope,
        result: Result<RawResponse, ApiError>,
    ) -> Result<RawResponse, ApiError> {
        match &result {
            Ok(response) => debug!(
                method = %request.method,
                path = %request.path,
                status = response.status.as_u16(),
                "Response received"
            ),
            Err(e) => warn!(
                method = %request.method,
                path = %request.path,
                error = %e,
                "Request failed"
            ),
        }
        result
    }
}
