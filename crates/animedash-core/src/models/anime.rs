//! Catalog entry models.
//!
//! The console and the backend disagree on one field name: entries come back
//! with `image_url`, but create/update payloads must carry `imageUrl`.
//! `AnimeDraft` owns that mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::string_or_number;

/// Genre name to number of catalog entries in it.
pub type GenreCounts = BTreeMap<String, u64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anime {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<AnimeLinks>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeLinks {
    #[serde(rename = "self")]
    pub self_link: String,
}

impl Anime {
    pub fn genre_display(&self) -> &str {
        self.genre.as_deref().unwrap_or("-")
    }
}

/// Payload for `POST /anime` and `PUT /anime/{id}`.
///
/// Unset fields are left out of the body so an update only touches what was
/// given. `slug` is generated by the backend and never sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnimeDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl AnimeDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.genre.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
    }
}

impl From<&Anime> for AnimeDraft {
    fn from(anime: &Anime) -> Self {
        Self {
            title: Some(anime.title.clone()),
            genre: anime.genre.clone(),
            description: anime.description.clone(),
            image_url: anime.image_url.clone(),
        }
    }
}

/// Query for `GET /anime/search`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimeQuery {
    pub page: u32,
    pub q: Option<String>,
    pub genre: Option<String>,
}

impl Default for AnimeQuery {
    fn default() -> Self {
        Self {
            page: 1,
            q: None,
            genre: None,
        }
    }
}

impl AnimeQuery {
    pub fn page(page: u32) -> Self {
        Self {
            page: page.max(1),
            ..Self::default()
        }
    }

    /// Query string pairs. Blank search terms and genres are omitted.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("page".to_string(), self.page.max(1).to_string())];
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            pairs.push(("q".to_string(), q.to_string()));
        }
        if let Some(genre) = self.genre.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
            pairs.push(("genre".to_string(), genre.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_uses_backend_field_name() {
        let draft = AnimeDraft::new("Attack on Titan")
            .genre("Action")
            .image_url("https://img.example/aot.png");
        let json = serde_json::to_value(&draft).expect("Failed to serialize draft");

        assert_eq!(json["title"], "Attack on Titan");
        assert_eq!(json["imageUrl"], "https://img.example/aot.png");
        assert!(json.get("image_url").is_none());
        assert!(json.get("slug").is_none());
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_parse_anime_with_numeric_id() {
        let json = r#"{"id":42,"title":"Mushishi","slug":"mushishi","genre":"Drama","description":null,"image_url":"https://img.example/m.png","links":{"self":"/api/anime/42"}}"#;
        let anime: Anime = serde_json::from_str(json).expect("Failed to parse anime");
        assert_eq!(anime.id, "42");
        assert_eq!(anime.description, None);
        assert_eq!(anime.links.as_ref().map(|l| l.self_link.as_str()), Some("/api/anime/42"));
    }

    #[test]
    fn test_parse_anime_camel_case_image() {
        let json = r#"{"id":"7","title":"Frieren","imageUrl":"https://img.example/f.png"}"#;
        let anime: Anime = serde_json::from_str(json).expect("Failed to parse anime");
        assert_eq!(anime.image_url.as_deref(), Some("https://img.example/f.png"));
        assert_eq!(anime.genre_display(), "-");
    }

    #[test]
    fn test_query_pairs_skip_blank_terms() {
        let query = AnimeQuery {
            page: 3,
            q: Some("  ".to_string()),
            genre: Some("Drama".to_string()),
        };
        assert_eq!(
            query.to_pairs(),
            vec![
                ("page".to_string(), "3".to_string()),
                ("genre".to_string(), "Drama".to_string()),
            ]
        );
        assert_eq!(AnimeQuery::page(0).page, 1);
    }

    #[test]
    fn test_draft_from_existing_entry() {
        let anime = Anime {
            id: "1".to_string(),
            title: "Monster".to_string(),
            slug: Some("monster".to_string()),
            genre: Some("Thriller".to_string()),
            description: None,
            image_url: None,
            links: None,
        };
        let draft = AnimeDraft::from(&anime);
        assert_eq!(draft.title.as_deref(), Some("Monster"));
        assert!(!draft.is_empty());
        assert!(AnimeDraft::default().is_empty());
    }
}
