//! Data models for the catalog backend.
//!
//! This module contains the wire shapes exchanged with the backend:
//!
//! - `ApiResponse`, `Meta`: the `{ data, meta }` envelope and pagination info
//! - `Anime`, `AnimeDraft`, `AnimeQuery`: catalog entries and their inputs
//! - `Webhook`, `WebhookDraft`: webhook registrations
//! - `HealthStatus`: backend health dashboard
//! - `AnalyticsData`: aggregate request metrics
//! - `AdminCheck`: result of the admin probe

pub mod analytics;
pub mod anime;
pub mod envelope;
pub mod health;
pub mod webhook;

pub use analytics::{AdminCheck, AnalyticsData, RecentRequest};
pub use anime::{Anime, AnimeDraft, AnimeLinks, AnimeQuery, GenreCounts};
pub use envelope::{ApiResponse, MaybeEnveloped, Meta};
pub use health::{HealthChecks, HealthStatus, MemoryUsage};
pub use webhook::{Webhook, WebhookDraft, WebhookEvent};

use serde::{Deserialize, Deserializer};

/// Accept either a JSON string or number and keep it as a string.
///
/// The backend is not consistent about ids (`"1"` vs `1`) or sizes
/// (`"128 MB"` vs `134217728`).
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
    })
}
