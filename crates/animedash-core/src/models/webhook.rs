use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::string_or_number;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: String,
}

impl Webhook {
    pub fn status_display(&self) -> &'static str {
        if self.is_active {
            "Active"
        } else {
            "Inactive"
        }
    }
}

/// Payload for `POST /webhooks`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookDraft {
    pub url: String,
    pub events: Vec<String>,
}

impl WebhookDraft {
    pub fn new(url: impl Into<String>, events: &[WebhookEvent]) -> Self {
        Self {
            url: url.into(),
            events: events.iter().map(|e| e.as_str().to_string()).collect(),
        }
    }
}

/// Catalog events a webhook can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookEvent {
    AnimeCreated,
    AnimeUpdated,
    AnimeDeleted,
}

impl WebhookEvent {
    pub const ALL: [WebhookEvent; 3] = [
        WebhookEvent::AnimeCreated,
        WebhookEvent::AnimeUpdated,
        WebhookEvent::AnimeDeleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEvent::AnimeCreated => "anime.created",
            WebhookEvent::AnimeUpdated => "anime.updated",
            WebhookEvent::AnimeDeleted => "anime.deleted",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WebhookEvent::AnimeCreated => "Anime Created",
            WebhookEvent::AnimeUpdated => "Anime Updated",
            WebhookEvent::AnimeDeleted => "Anime Deleted",
        }
    }
}

impl fmt::Display for WebhookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|e| e.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown webhook event '{}' (expected one of: anime.created, anime.updated, anime.deleted)",
                    s
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_from_str() {
        assert_eq!("anime.created".parse::<WebhookEvent>(), Ok(WebhookEvent::AnimeCreated));
        assert_eq!(" Anime.Deleted ".parse::<WebhookEvent>(), Ok(WebhookEvent::AnimeDeleted));
        assert!("anime.viewed".parse::<WebhookEvent>().is_err());
    }

    #[test]
    fn test_draft_serializes_event_names() {
        let draft = WebhookDraft::new(
            "https://example.com/hook",
            &[WebhookEvent::AnimeUpdated, WebhookEvent::AnimeDeleted],
        );
        let json = serde_json::to_value(&draft).expect("Failed to serialize draft");
        assert_eq!(json["events"], serde_json::json!(["anime.updated", "anime.deleted"]));
    }

    #[test]
    fn test_parse_webhook_numeric_id() {
        let json = r#"{"id":9,"url":"https://example.com","events":["anime.created"],"is_active":true,"created_at":"2024-01-02"}"#;
        let hook: Webhook = serde_json::from_str(json).expect("Failed to parse webhook");
        assert_eq!(hook.id, "9");
        assert_eq!(hook.status_display(), "Active");
    }
}
