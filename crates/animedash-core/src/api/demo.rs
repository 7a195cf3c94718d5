//! Local stand-in for the webhook and health endpoints in demo mode.
//!
//! The demo credential cannot be verified by the backend, so these calls are
//! answered from a fabricated table instead of the network.

use std::sync::Mutex;

use chrono::Utc;

use crate::models::{ApiResponse, HealthChecks, HealthStatus, MemoryUsage, Webhook, WebhookDraft};

use super::ApiError;

pub struct DemoBackend {
    webhooks: Mutex<Vec<Webhook>>,
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoBackend {
    pub fn new() -> Self {
        Self {
            webhooks: Mutex::new(fixture_webhooks()),
        }
    }

    pub fn list_webhooks(&self) -> ApiResponse<Vec<Webhook>> {
        ApiResponse::new(self.lock().clone())
    }

    pub fn create_webhook(&self, draft: &WebhookDraft) -> ApiResponse<Webhook> {
        let mut webhooks = self.lock();
        let next_id = webhooks
            .iter()
            .filter_map(|w| w.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let webhook = Webhook {
            id: next_id.to_string(),
            url: draft.url.clone(),
            events: draft.events.clone(),
            is_active: true,
            created_at: Utc::now().format("%Y-%m-%d").to_string(),
        };
        webhooks.push(webhook.clone());
        ApiResponse::new(webhook)
    }

    pub fn delete_webhook(&self, id: &str) -> Result<(), ApiError> {
        let mut webhooks = self.lock();
        let before = webhooks.len();
        webhooks.retain(|w| w.id != id);
        if webhooks.len() == before {
            return Err(ApiError::NotFound(format!("webhook {}", id)));
        }
        Ok(())
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "ok".to_string(),
            checks: HealthChecks {
                database: "ok".to_string(),
                cache: "ok".to_string(),
                firestore: "ok".to_string(),
            },
            memory_usage: MemoryUsage {
                used: "128 MB".to_string(),
                peak: "256 MB".to_string(),
            },
            uptime: "12d 4h 32m".to_string(),
            server_time: Utc::now().to_rfc3339(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Webhook>> {
        self.webhooks.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn fixture_webhooks() -> Vec<Webhook> {
    vec![
        Webhook {
            id: "1".to_string(),
            url: "https://discord.com/api/webhooks/123".to_string(),
            events: vec!["anime.created".to_string()],
            is_active: true,
            created_at: "2023-11-01".to_string(),
        },
        Webhook {
            id: "2".to_string(),
            url: "https://my-app.com/callback".to_string(),
            events: vec!["anime.updated".to_string(), "anime.deleted".to_string()],
            is_active: false,
            created_at: "2023-11-05".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WebhookEvent;

    #[test]
    fn test_fixtures() {
        let demo = DemoBackend::new();
        let ids: Vec<String> = demo.list_webhooks().data.into_iter().map(|w| w.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_create_and_delete() {
        let demo = DemoBackend::new();
        let created = demo
            .create_webhook(&WebhookDraft::new(
                "https://example.com/hook",
                &[WebhookEvent::AnimeCreated],
            ))
            .data;
        assert_eq!(created.id, "3");
        assert!(created.is_active);
        assert_eq!(demo.list_webhooks().data.len(), 3);

        demo.delete_webhook("1").unwrap();
        assert!(matches!(demo.delete_webhook("1"), Err(ApiError::NotFound(_))));
        assert_eq!(demo.list_webhooks().data.len(), 2);
    }

    #[test]
    fn test_health_is_healthy() {
        let health = DemoBackend::new().health();
        assert!(health.is_healthy());
        assert!(chrono::DateTime::parse_from_rfc3339(&health.server_time).is_ok());
    }
}
