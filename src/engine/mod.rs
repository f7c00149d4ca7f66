use crate::download::{DownloadEvent, DownloadTask, Resolver};
use crate::search::{PageDirection, SearchBackend, SearchError, SearchPage, SearchSession, VideoRef};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

/// Caller contract violations, rejected before any I/O happens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("please enter a search keyword")]
    EmptyKeyword,

    #[error("please select a download folder first")]
    NoDestination,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Search(#[from] SearchError),
}

/// The single entry point the front-end talks to: keyword search with
/// paging, and progress-reporting downloads.
///
/// At most one download is tracked at a time. Starting a new one while
/// the previous task is still running requests cancellation of the old
/// task first, so a superseded transfer does not keep writing unobserved.
pub struct Engine {
    session: SearchSession,
    resolver: Arc<dyn Resolver>,
    current_download: Option<DownloadTask>,
}

impl Engine {
    pub fn new(backend: Box<dyn SearchBackend>, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            session: SearchSession::new(backend),
            resolver,
            current_download: None,
        }
    }

    pub async fn search(&mut self, keyword: &str) -> Result<&SearchPage, EngineError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(InputError::EmptyKeyword.into());
        }
        Ok(self.session.search(keyword).await?)
    }

    pub async fn page(&mut self, direction: PageDirection) -> Result<&SearchPage, EngineError> {
        Ok(self.session.page(direction).await?)
    }

    pub fn page_number(&self) -> u32 {
        self.session.page_number()
    }

    pub fn current_page(&self) -> &SearchPage {
        self.session.current_page()
    }

    /// Start downloading `video` into `dest_dir` and return the event
    /// stream for the new task.
    pub fn download(
        &mut self,
        video: VideoRef,
        dest_dir: &Path,
    ) -> Result<UnboundedReceiver<DownloadEvent>, EngineError> {
        if dest_dir.as_os_str().is_empty() {
            return Err(InputError::NoDestination.into());
        }

        if let Some(previous) = self.current_download.take() {
            if previous.is_running() {
                warn!("Superseding a running download, requesting cancellation");
                previous.cancel();
            }
        }

        info!("Starting download: {}", video.url);
        let (task, events) = DownloadTask::start(
            Arc::clone(&self.resolver),
            video,
            dest_dir.to_path_buf(),
        );
        self.current_download = Some(task);
        Ok(events)
    }
}
