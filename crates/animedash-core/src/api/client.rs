//! API client for the catalog backend.
//!
//! This module provides the `ApiClient` struct. Every call goes through the
//! middleware pipeline, which attaches the stored credential and applies the
//! 401 policy. In demo mode the webhook and health calls are answered by the
//! local `DemoBackend`; catalog calls always go to the network.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::auth::SessionStore;
use crate::config::Config;
use crate::models::{
    AdminCheck, AnalyticsData, Anime, AnimeDraft, AnimeQuery, ApiResponse, GenreCounts,
    HealthStatus, MaybeEnveloped, Webhook, WebhookDraft,
};

use super::demo::DemoBackend;
use super::pipeline::Pipeline;
use super::transport::{HttpTransport, RawResponse, RequestEnvelope, Transport};
use super::ApiError;

/// Body of a successful Google exchange: `{ token }` or the bare token string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TokenResponse {
    Object { token: String },
    Bare(String),
}

impl TokenResponse {
    fn into_token(self) -> String {
        match self {
            TokenResponse::Object { token } => token,
            TokenResponse::Bare(token) => token,
        }
    }
}

#[derive(Debug, Serialize)]
struct GoogleLoginRequest<'a> {
    token: &'a str,
}

/// API client for the catalog backend.
/// Clone is cheap - the transport, session and demo table are shared.
#[derive(Clone)]
pub struct ApiClient {
    pipeline: Pipeline,
    session: Arc<SessionStore>,
    demo: Arc<DemoBackend>,
}

impl ApiClient {
    /// Create a client talking HTTP to `base_url`
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: Arc<SessionStore>,
    ) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(base_url, timeout)?;
        Ok(Self::with_transport(Arc::new(transport), session))
    }

    pub fn from_config(config: &Config, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, config.request_timeout(), session)
    }

    /// Create a client over any transport, with the standard middleware stack.
    pub fn with_transport(transport: Arc<dyn Transport>, session: Arc<SessionStore>) -> Self {
        Self {
            pipeline: Pipeline::standard(transport, Arc::clone(&session)),
            session,
            demo: Arc::new(DemoBackend::new()),
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    async fn send(&self, request: RequestEnvelope) -> Result<RawResponse, ApiError> {
        self.pipeline.execute(request).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T, ApiError> {
        self.send(RequestEnvelope::get(path).query(query)).await?.json()
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(RequestEnvelope::post(path).json(to_json(body)?)).await?.json()
    }

    async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(RequestEnvelope::put(path).json(to_json(body)?)).await?.json()
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(RequestEnvelope::delete(path)).await?;
        Ok(())
    }

    // ===== Authentication =====

    /// Exchange a Google ID token for a backend bearer token.
    ///
    /// The token is returned, not stored; the caller decides when to log in.
    pub async fn exchange_google_token(&self, id_token: &str) -> Result<String, ApiError> {
        let response: MaybeEnveloped<TokenResponse> = self
            .post("/auth/google", &GoogleLoginRequest { token: id_token })
            .await?;
        let token = response.into_inner().into_token();
        if token.is_empty() {
            return Err(ApiError::InvalidResponse(
                "Login response contained an empty token".to_string(),
            ));
        }
        Ok(token)
    }

    /// End the session. The local credential is cleared even when the
    /// backend call fails; that failure is still returned. A credential that
    /// storage would not give up is reported first.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = if self.session.is_bypass_mode() || !self.session.is_authenticated() {
            Ok(())
        } else {
            self.send(RequestEnvelope::post("/auth/logout"))
                .await
                .map(|_| ())
        };
        if let Err(ref e) = result {
            warn!(error = %e, "Server-side logout failed");
        }
        let cleared = self
            .session
            .clear_credential()
            .map_err(|e| ApiError::CredentialNotRemoved(format!("{:#}", e)));
        info!("Logged out");
        cleared.and(result)
    }

    pub async fn admin_check(&self) -> Result<AdminCheck, ApiError> {
        self.get("/admin-check", Vec::new()).await
    }

    // ===== Catalog =====

    /// Search the catalog, one page at a time
    pub async fn search_anime(
        &self,
        query: &AnimeQuery,
    ) -> Result<ApiResponse<Vec<Anime>>, ApiError> {
        let response: ApiResponse<Vec<Anime>> =
            self.get("/anime/search", query.to_pairs()).await?;
        debug!(
            count = response.data.len(),
            page = query.page,
            cached = response.meta.as_ref().map(|m| m.cached).unwrap_or(false),
            "Catalog page fetched"
        );
        Ok(response)
    }

    pub async fn get_anime(&self, id: &str) -> Result<ApiResponse<Anime>, ApiError> {
        self.get(&format!("/anime/{}", path_segment(id)?), Vec::new()).await
    }

    pub async fn create_anime(&self, draft: &AnimeDraft) -> Result<ApiResponse<Anime>, ApiError> {
        self.post("/anime", draft).await
    }

    pub async fn update_anime(
        &self,
        id: &str,
        draft: &AnimeDraft,
    ) -> Result<ApiResponse<Anime>, ApiError> {
        self.put(&format!("/anime/{}", path_segment(id)?), draft).await
    }

    pub async fn delete_anime(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/anime/{}", path_segment(id)?)).await
    }

    pub async fn genres(&self) -> Result<GenreCounts, ApiError> {
        let response: MaybeEnveloped<GenreCounts> = self.get("/anime/genres", Vec::new()).await?;
        Ok(response.into_inner())
    }

    // ===== Analytics =====

    pub async fn analytics(&self) -> Result<AnalyticsData, ApiError> {
        let response: MaybeEnveloped<AnalyticsData> =
            self.get("/analytics/dashboard", Vec::new()).await?;
        Ok(response.into_inner())
    }

    // ===== Webhooks =====

    pub async fn list_webhooks(&self) -> Result<ApiResponse<Vec<Webhook>>, ApiError> {
        if self.session.is_bypass_mode() {
            debug!("Demo mode, serving webhooks locally");
            return Ok(self.demo.list_webhooks());
        }
        self.get("/webhooks", Vec::new()).await
    }

    pub async fn create_webhook(
        &self,
        draft: &WebhookDraft,
    ) -> Result<ApiResponse<Webhook>, ApiError> {
        if self.session.is_bypass_mode() {
            debug!("Demo mode, creating webhook locally");
            return Ok(self.demo.create_webhook(draft));
        }
        self.post("/webhooks", draft).await
    }

    pub async fn delete_webhook(&self, id: &str) -> Result<(), ApiError> {
        if self.session.is_bypass_mode() {
            debug!(id, "Demo mode, deleting webhook locally");
            return self.demo.delete_webhook(id);
        }
        self.delete(&format!("/webhooks/{}", path_segment(id)?)).await
    }

    // ===== Health =====

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        if self.session.is_bypass_mode() {
            return Ok(self.demo.health());
        }
        let response: MaybeEnveloped<HealthStatus> = self.get("/health", Vec::new()).await?;
        Ok(response.into_inner())
    }
}

/// Encode a caller-supplied id as exactly one path segment.
fn path_segment(id: &str) -> Result<Cow<'_, str>, ApiError> {
    match id {
        "" | "." | ".." => Err(ApiError::InvalidId(id.to_string())),
        _ => Ok(urlencoding::encode(id)),
    }
}

fn to_json<B: Serialize>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to encode request body: {}", e)))
}
