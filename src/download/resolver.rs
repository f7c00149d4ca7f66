use super::types::ResolvedStream;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// The reference is gone, restricted, or has no progressive variant.
    #[error("could not resolve a downloadable stream: {0}")]
    Resolution(String),

    #[error("network error during transfer: {0}")]
    Network(#[from] reqwest::Error),

    #[error("could not write to the destination: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("resolver tool unavailable: {0}")]
    Tool(String),

    #[error("download cancelled")]
    Cancelled,
}

/// Progress callback: cumulative bytes written, then total bytes.
pub type ProgressFn<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

#[async_trait]
pub trait Resolver: Send + Sync {
    /// Human-readable name of the resolver
    fn name(&self) -> &'static str;

    /// Resolve a video URL to its best progressive stream variant.
    async fn resolve(&self, url: &str) -> Result<ResolvedStream, DownloadError>;

    /// Stream the payload into `dest_dir`, invoking `on_progress` after
    /// each chunk and checking `cancel` between chunks. Returns the path
    /// of the written file. A partial file may remain after a failure.
    async fn transfer(
        &self,
        stream: &ResolvedStream,
        dest_dir: &Path,
        cancel: &AtomicBool,
        on_progress: ProgressFn<'_>,
    ) -> Result<PathBuf, DownloadError>;

    /// Test if this resolver is available on the system
    async fn test_availability() -> bool
    where
        Self: Sized;
}
