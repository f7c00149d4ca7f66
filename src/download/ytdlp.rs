use super::{
    resolver::{DownloadError, ProgressFn, Resolver},
    types::ResolvedStream,
};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Resolves a video URL to its stream variants with yt-dlp and transfers
/// the selected variant over plain HTTP.
pub struct YtDlpResolver {
    client: reqwest::Client,
}

impl YtDlpResolver {
    pub fn new() -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }

    async fn probe(&self, url: &str) -> Result<Value, DownloadError> {
        debug!("Probing stream variants with yt-dlp for: {}", url);

        let output = tokio::time::timeout(
            std::time::Duration::from_secs(30),
            tokio::process::Command::new("yt-dlp")
                .arg("--dump-json")
                .arg("--no-download")
                .arg("--no-warnings")
                .arg(url)
                .output(),
        )
        .await
        .map_err(|_| DownloadError::Resolution("stream probe timed out".to_string()))?
        .map_err(|e| DownloadError::Tool(format!("failed to run yt-dlp: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .next_back()
                .unwrap_or("yt-dlp failed to fetch metadata");
            return Err(DownloadError::Resolution(detail.to_string()));
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&json_str)
            .map_err(|e| DownloadError::Resolution(format!("malformed stream metadata: {e}")))
    }

    /// Among progressive (audio+video combined) variants, pick the
    /// highest resolution. Adaptive and audio-only variants are never
    /// a fallback.
    fn select_stream(json: &Value) -> Result<ResolvedStream, DownloadError> {
        let title = json["title"].as_str().unwrap_or("video").to_string();

        let formats = json["formats"].as_array().ok_or_else(|| {
            DownloadError::Resolution(format!("no stream variants listed for '{title}'"))
        })?;

        let best = formats
            .iter()
            .filter(|f| is_progressive(f))
            .filter_map(|f| f["url"].as_str().map(|url| (f, url)))
            .max_by_key(|(f, _)| f["height"].as_u64().unwrap_or(0))
            .ok_or_else(|| {
                DownloadError::Resolution(format!(
                    "no progressive (audio+video) stream available for '{title}'"
                ))
            })?;

        let (format, media_url) = best;
        let total_bytes = format["filesize"]
            .as_u64()
            .or_else(|| format["filesize_approx"].as_f64().map(|v| v as u64))
            .unwrap_or(0);
        if total_bytes == 0 {
            warn!("Stream size unknown for '{}', progress may be coarse", title);
        }

        Ok(ResolvedStream {
            media_url: media_url.to_string(),
            total_bytes,
            title,
            ext: format["ext"].as_str().unwrap_or("mp4").to_string(),
        })
    }
}

fn is_progressive(format: &Value) -> bool {
    let has_codec = |key: &str| {
        format[key]
            .as_str()
            .is_some_and(|codec| !codec.is_empty() && codec != "none")
    };
    has_codec("vcodec") && has_codec("acodec")
}

#[async_trait]
impl Resolver for YtDlpResolver {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn resolve(&self, url: &str) -> Result<ResolvedStream, DownloadError> {
        let json = self.probe(url).await?;
        let stream = Self::select_stream(&json)?;
        info!(
            "Resolved '{}' ({} bytes, .{})",
            stream.title, stream.total_bytes, stream.ext
        );
        Ok(stream)
    }

    async fn transfer(
        &self,
        stream: &ResolvedStream,
        dest_dir: &Path,
        cancel: &AtomicBool,
        on_progress: ProgressFn<'_>,
    ) -> Result<PathBuf, DownloadError> {
        let path = dest_dir.join(stream.file_name());
        info!("Transferring '{}' to {}", stream.title, path.display());

        let response = self
            .client
            .get(&stream.media_url)
            .send()
            .await?
            .error_for_status()?;

        let total_bytes = if stream.total_bytes > 0 {
            stream.total_bytes
        } else {
            response.content_length().unwrap_or(0)
        };

        // The destination directory is externally owned; a missing or
        // unwritable directory is the caller's error, not ours to fix.
        let mut file = tokio::fs::File::create(&path).await?;

        let mut bytes_written = 0u64;
        on_progress(bytes_written, total_bytes);

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            if cancel.load(Ordering::Relaxed) {
                return Err(DownloadError::Cancelled);
            }
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            bytes_written += chunk.len() as u64;
            on_progress(bytes_written, total_bytes);
        }
        file.flush().await?;

        info!("Wrote {} bytes to {}", bytes_written, path.display());
        Ok(path)
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
