use super::{
    backend::{SearchBackend, SearchError},
    types::{SearchPage, VideoRef},
};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

// The extractor is asked for one flat batch of ten results per keyword;
// it has no notion of continuation, so pages never carry cursors.
const SEARCH_PREFIX: &str = "ytsearch10";

/// Bulk-extraction search backend. One non-paginated batch per query,
/// produced by yt-dlp's flat playlist extraction.
pub struct YtDlpSearch;

impl YtDlpSearch {
    pub fn new() -> Self {
        Self
    }

    fn parse_batch(json: &Value) -> SearchPage {
        let entries = json["entries"].as_array().cloned().unwrap_or_default();

        let mut results = Vec::with_capacity(entries.len());
        for entry in &entries {
            let (Some(title), Some(url)) = (entry["title"].as_str(), entry["url"].as_str()) else {
                warn!("Skipping search entry without title or url");
                continue;
            };

            results.push(VideoRef {
                id: entry["id"].as_str().unwrap_or(url).to_string(),
                title: title.to_string(),
                url: url.to_string(),
                thumbnail_url: None,
            });
        }

        SearchPage {
            results,
            next_cursor: None,
            prev_cursor: None,
        }
    }
}

#[async_trait]
impl SearchBackend for YtDlpSearch {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn query(&self, keyword: &str, _cursor: Option<&str>) -> Result<SearchPage, SearchError> {
        debug!("Running flat yt-dlp search for: {}", keyword);

        let output = tokio::time::timeout(
            std::time::Duration::from_secs(30),
            tokio::process::Command::new("yt-dlp")
                .arg("--dump-single-json")
                .arg("--flat-playlist")
                .arg("--no-warnings")
                .arg(format!("{SEARCH_PREFIX}:{keyword}"))
                .output(),
        )
        .await
        .map_err(|_| SearchError::Backend("yt-dlp search timed out".to_string()))??;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(SearchError::Backend(format!(
                "yt-dlp search failed: {}",
                error.trim()
            )));
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        let json: Value = serde_json::from_str(&json_str)
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        Ok(Self::parse_batch(&json))
    }

    async fn test_availability() -> bool {
        match tokio::process::Command::new("yt-dlp")
            .arg("--version")
            .output()
            .await
        {
            Ok(output) => {
                if output.status.success() {
                    let version = String::from_utf8_lossy(&output.stdout);
                    info!("yt-dlp is available, version: {}", version.trim());
                    true
                } else {
                    warn!("yt-dlp command failed");
                    false
                }
            }
            Err(e) => {
                warn!("yt-dlp not found: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch() {
        let json: Value = serde_json::from_str(
            r#"{
                "entries": [
                    {"id": "a1", "title": "first", "url": "https://www.youtube.com/watch?v=a1"},
                    {"id": "b2", "title": "second", "url": "https://www.youtube.com/watch?v=b2"}
                ]
            }"#,
        )
        .unwrap();

        let page = YtDlpSearch::parse_batch(&json);
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].title, "first");
        assert_eq!(page.results[1].id, "b2");
        // Flat extraction cannot paginate
        assert_eq!(page.next_cursor, None);
        assert_eq!(page.prev_cursor, None);
    }

    #[test]
    fn test_malformed_entries_are_skipped_not_failed() {
        let json: Value = serde_json::from_str(
            r#"{
                "entries": [
                    {"title": "no url"},
                    {"url": "https://example.com/no-title"},
                    {"title": "ok", "url": "https://example.com/ok"}
                ]
            }"#,
        )
        .unwrap();

        let page = YtDlpSearch::parse_batch(&json);
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].title, "ok");
    }

    #[test]
    fn test_all_malformed_yields_empty_page() {
        let json: Value =
            serde_json::from_str(r#"{"entries": [{"title": "no url"}, {}]}"#).unwrap();
        let page = YtDlpSearch::parse_batch(&json);
        assert!(page.is_empty());
    }

    #[test]
    fn test_missing_entries_yields_empty_page() {
        let json: Value = serde_json::from_str(r#"{"title": "odd output"}"#).unwrap();
        assert!(YtDlpSearch::parse_batch(&json).is_empty());
    }
}
