use super::types::SearchPage;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to run search tool: {0}")]
    Io(#[from] std::io::Error),

    #[error("search backend error: {0}")]
    Backend(String),

    #[error("failed to parse search results: {0}")]
    Parse(String),
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Human-readable name of the backend
    fn name(&self) -> &'static str;

    /// Run a keyword query, optionally continuing from an opaque cursor.
    ///
    /// The keyword is assumed non-empty; the caller validates user input
    /// before it reaches a backend. Backends that cannot paginate ignore
    /// the cursor and return a page with both cursors absent.
    async fn query(&self, keyword: &str, cursor: Option<&str>) -> Result<SearchPage, SearchError>;

    /// Test if this backend is usable on the system
    async fn test_availability() -> bool
    where
        Self: Sized;
}
