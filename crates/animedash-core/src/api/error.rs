use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// A 401 outside demo mode. The credential has already been cleared when
    /// this is returned; the caller must send the user back to login.
    #[error("Session expired - please log in again")]
    SessionExpired,

    /// A 401 while in demo mode. The session is left untouched.
    #[error("Unauthorized - the backend rejected the demo credential")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed ({status}): {message}")]
    Validation {
        status: StatusCode,
        message: String,
        errors: serde_json::Value,
    },

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error ({status}): {body}")]
    ServerError { status: StatusCode, body: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Credential cannot be sent as a header")]
    InvalidHeader,

    #[error("Invalid id: {0:?}")]
    InvalidId(String),

    /// The session ended in this process but storage still holds the token.
    #[error("Logged out, but the stored credential could not be removed: {0}")]
    CredentialNotRemoved(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Laravel-style validation body: `{ "message": "...", "errors": { field: [..] } }`
#[derive(Debug, Deserialize)]
struct ValidationBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Classify a non-success response.
    ///
    /// A 401 always maps to `SessionExpired` here; the auth failure
    /// middleware downgrades it to `Unauthorized` in demo mode.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::SessionExpired,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            409 => ApiError::Conflict(truncated),
            400 | 422 => match serde_json::from_str::<ValidationBody>(body) {
                Ok(parsed) if parsed.message.is_some() || parsed.errors.is_some() => {
                    ApiError::Validation {
                        status,
                        message: parsed.message.unwrap_or_else(|| "Invalid request".to_string()),
                        errors: parsed.errors.unwrap_or(serde_json::Value::Null),
                    }
                }
                _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
            },
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError {
                status,
                body: truncated,
            },
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }

    /// Network, timeout and 5xx failures: shown as a generic failure, never retried.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::Timeout | ApiError::ServerError { .. }
        )
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(err)
        }
    }
}
