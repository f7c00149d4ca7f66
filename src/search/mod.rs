mod api;
mod backend;
mod types;
mod ytdlp;

pub use api::ApiSearch;
pub use backend::{SearchBackend, SearchError};
pub use types::{SearchPage, VideoRef};
pub use ytdlp::YtDlpSearch;

use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDirection {
    Forward,
    Backward,
}

/// Drives one backend across result pages, holding the keyword, the
/// current page and the 1-based page number.
///
/// A `page` call in a direction with no cursor is a no-op: the current
/// page is kept and the page number does not move. Backend errors
/// propagate unchanged and leave the session state untouched.
pub struct SearchSession {
    backend: Box<dyn SearchBackend>,
    keyword: String,
    page: SearchPage,
    page_number: u32,
}

impl SearchSession {
    pub fn new(backend: Box<dyn SearchBackend>) -> Self {
        Self {
            backend,
            keyword: String::new(),
            page: SearchPage::default(),
            page_number: 1,
        }
    }

    /// Start a fresh search, discarding any previous pages and cursors.
    pub async fn search(&mut self, keyword: &str) -> Result<&SearchPage, SearchError> {
        info!("Searching {} for '{}'", self.backend.name(), keyword);

        let page = self.backend.query(keyword, None).await?;
        self.keyword = keyword.to_string();
        self.page = page;
        self.page_number = 1;
        Ok(&self.page)
    }

    pub async fn page(&mut self, direction: PageDirection) -> Result<&SearchPage, SearchError> {
        let cursor = match direction {
            PageDirection::Forward => self.page.next_cursor.clone(),
            PageDirection::Backward => self.page.prev_cursor.clone(),
        };

        let Some(cursor) = cursor else {
            debug!("No {:?} cursor on the current page, keeping it", direction);
            return Ok(&self.page);
        };

        let page = self.backend.query(&self.keyword, Some(&cursor)).await?;
        self.page = page;
        self.page_number = match direction {
            PageDirection::Forward => self.page_number + 1,
            PageDirection::Backward => self.page_number.saturating_sub(1).max(1),
        };
        Ok(&self.page)
    }

    pub fn current_page(&self) -> &SearchPage {
        &self.page
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedBackend {
        pages: Mutex<VecDeque<Result<SearchPage, SearchError>>>,
        queries: Mutex<Vec<(String, Option<String>)>>,
    }

    impl ScriptedBackend {
        fn new(pages: Vec<Result<SearchPage, SearchError>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SearchBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn query(
            &self,
            keyword: &str,
            cursor: Option<&str>,
        ) -> Result<SearchPage, SearchError> {
            self.queries
                .lock()
                .unwrap()
                .push((keyword.to_string(), cursor.map(str::to_string)));
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .expect("backend queried more often than scripted")
        }

        async fn test_availability() -> bool {
            true
        }
    }

    fn video(id: &str) -> VideoRef {
        VideoRef {
            id: id.to_string(),
            title: format!("video {id}"),
            url: format!("https://www.youtube.com/watch?v={id}"),
            thumbnail_url: None,
        }
    }

    fn page(ids: &[&str], next: Option<&str>, prev: Option<&str>) -> SearchPage {
        SearchPage {
            results: ids.iter().map(|id| video(id)).collect(),
            next_cursor: next.map(str::to_string),
            prev_cursor: prev.map(str::to_string),
        }
    }

    async fn session_with(
        pages: Vec<Result<SearchPage, SearchError>>,
    ) -> (SearchSession, std::sync::Arc<ScriptedBackend>) {
        // The session owns the backend, so hand out a second Arc for
        // inspecting the recorded queries.
        let backend = std::sync::Arc::new(ScriptedBackend::new(pages));
        struct Shared(std::sync::Arc<ScriptedBackend>);

        #[async_trait]
        impl SearchBackend for Shared {
            fn name(&self) -> &'static str {
                self.0.name()
            }
            async fn query(
                &self,
                keyword: &str,
                cursor: Option<&str>,
            ) -> Result<SearchPage, SearchError> {
                self.0.query(keyword, cursor).await
            }
            async fn test_availability() -> bool {
                true
            }
        }

        let session = SearchSession::new(Box::new(Shared(backend.clone())));
        (session, backend)
    }

    #[tokio::test]
    async fn test_fresh_search_resets_to_page_one() {
        let (mut session, backend) =
            session_with(vec![Ok(page(&["a"], Some("T1"), None))]).await;

        session.search("lofi").await.unwrap();

        assert_eq!(session.page_number(), 1);
        assert_eq!(session.keyword(), "lofi");
        assert_eq!(session.current_page().results.len(), 1);
        assert_eq!(
            backend.queries.lock().unwrap().as_slice(),
            &[("lofi".to_string(), None)]
        );
    }

    #[tokio::test]
    async fn test_backward_on_first_page_is_noop() {
        let (mut session, backend) =
            session_with(vec![Ok(page(&["a"], Some("T1"), None))]).await;

        session.search("lofi").await.unwrap();
        session.page(PageDirection::Backward).await.unwrap();

        assert_eq!(session.page_number(), 1);
        assert_eq!(backend.queries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_forward_without_next_cursor_keeps_current_page() {
        let (mut session, backend) = session_with(vec![Ok(page(&["a", "b"], None, None))]).await;

        session.search("lofi").await.unwrap();
        let before: Vec<String> = session
            .current_page()
            .results
            .iter()
            .map(|v| v.id.clone())
            .collect();

        session.page(PageDirection::Forward).await.unwrap();

        let after: Vec<String> = session
            .current_page()
            .results
            .iter()
            .map(|v| v.id.clone())
            .collect();
        assert_eq!(before, after);
        assert_eq!(session.page_number(), 1);
        assert_eq!(backend.queries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_forward_with_token_advances_page() {
        let (mut session, backend) = session_with(vec![
            Ok(page(&["a"], Some("T1"), None)),
            Ok(page(&["b"], Some("T2"), Some("T0"))),
        ])
        .await;

        session.search("lofi").await.unwrap();
        session.page(PageDirection::Forward).await.unwrap();

        assert_eq!(session.page_number(), 2);
        assert_eq!(session.current_page().results[0].id, "b");
        assert_eq!(
            backend.queries.lock().unwrap().as_slice(),
            &[
                ("lofi".to_string(), None),
                ("lofi".to_string(), Some("T1".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn test_flat_batch_pages_are_unconditional_noops() {
        let (mut session, backend) =
            session_with(vec![Ok(page(&["a", "b", "c"], None, None))]).await;

        session.search("lofi").await.unwrap();
        session.page(PageDirection::Forward).await.unwrap();
        session.page(PageDirection::Backward).await.unwrap();

        assert_eq!(session.page_number(), 1);
        assert_eq!(session.current_page().results.len(), 3);
        assert_eq!(backend.queries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_backend_error_leaves_session_unchanged() {
        let (mut session, _backend) = session_with(vec![
            Ok(page(&["a"], Some("T1"), None)),
            Err(SearchError::Backend("boom".to_string())),
        ])
        .await;

        session.search("lofi").await.unwrap();
        let result = session.page(PageDirection::Forward).await;

        assert!(result.is_err());
        assert_eq!(session.page_number(), 1);
        assert_eq!(session.current_page().results[0].id, "a");
    }

    #[tokio::test]
    async fn test_page_before_any_search_is_noop() {
        let (mut session, backend) = session_with(vec![]).await;

        session.page(PageDirection::Forward).await.unwrap();

        assert_eq!(session.page_number(), 1);
        assert!(session.current_page().is_empty());
        assert!(backend.queries.lock().unwrap().is_empty());
    }
}
