use super::{
    backend::{SearchBackend, SearchError},
    types::{SearchPage, VideoRef},
};
use crate::config::ApiCredentials;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/search";
const PAGE_SIZE: &str = "10";
const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Catalog search backend. Token-paginated: the provider hands back
/// continuation tokens which map directly onto the page cursors.
pub struct ApiSearch {
    client: reqwest::Client,
    credentials: ApiCredentials,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    items: Option<Vec<SearchItem>>,
    next_page_token: Option<String>,
    prev_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: Option<ItemId>,
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: Option<String>,
}

impl ApiSearch {
    pub fn new(credentials: ApiCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    fn page_from_response(response: SearchResponse) -> SearchPage {
        // A response without an items collection is a valid zero-result
        // page, not an error.
        let items = response.items.unwrap_or_default();

        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let id = item.id.and_then(|id| id.video_id);
            let snippet = item.snippet;

            let (Some(id), Some(snippet)) = (id, snippet) else {
                warn!("Skipping search result without video id or snippet");
                continue;
            };
            let Some(title) = snippet.title else {
                warn!("Skipping search result without a title");
                continue;
            };

            let thumbnail_url = snippet
                .thumbnails
                .and_then(|t| t.default)
                .and_then(|t| t.url);

            results.push(VideoRef {
                url: format!("{WATCH_URL_PREFIX}{id}"),
                id,
                title,
                thumbnail_url,
            });
        }

        SearchPage {
            results,
            next_cursor: response.next_page_token,
            prev_cursor: response.prev_page_token,
        }
    }
}

#[async_trait]
impl SearchBackend for ApiSearch {
    fn name(&self) -> &'static str {
        "catalog-api"
    }

    async fn query(&self, keyword: &str, cursor: Option<&str>) -> Result<SearchPage, SearchError> {
        debug!("Catalog search for '{}' (cursor: {:?})", keyword, cursor);

        let mut request = self.client.get(SEARCH_ENDPOINT).query(&[
            ("part", "snippet"),
            ("q", keyword),
            ("type", "video"),
            ("maxResults", PAGE_SIZE),
            ("key", self.credentials.key()),
        ]);
        if let Some(token) = cursor {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(SearchError::Backend(format!(
                "catalog search failed: HTTP {}",
                response.status()
            )));
        }

        let body: SearchResponse = response.json().await?;
        Ok(Self::page_from_response(body))
    }

    async fn test_availability() -> bool {
        // The catalog endpoint needs no local tooling, only a key, which
        // is checked when the backend is constructed.
        true
    }
}
