use serde::{Deserialize, Serialize};

/// Generic `{ data, meta }` wrapper returned by list and detail endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data, meta: None }
    }
}

/// Pagination and cache information for paginated endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_page: Option<u32>,
}

fn first_page() -> u32 {
    1
}

impl Meta {
    /// Whether a page after `page` exists. A missing `last_page` means one page.
    pub fn has_next(&self, page: u32) -> bool {
        page < self.last_page.unwrap_or(1)
    }

    pub fn has_prev(&self, page: u32) -> bool {
        page > 1
    }
}

/// Some endpoints answer with a bare object, some wrap it in `{ data }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MaybeEnveloped<T> {
    Enveloped { data: T },
    Bare(T),
}

impl<T> MaybeEnveloped<T> {
    pub fn into_inner(self) -> T {
        match self {
            MaybeEnveloped::Enveloped { data } => data,
            MaybeEnveloped::Bare(data) => data,
        }
    }
}
