mod resolver;
mod types;
mod ytdlp;

pub use resolver::{DownloadError, ProgressFn, Resolver};
pub use types::{percent_complete, DownloadEvent, ResolvedStream, TaskStatus};
pub use ytdlp::YtDlpResolver;

use crate::search::VideoRef;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

/// One in-flight transfer wrapped as an observable unit of work.
///
/// The worker owns the event sender, so the receiver sees zero or more
/// `Progress` events in non-decreasing order, one terminal event, and
/// then the end of the stream. A task is terminal once `Completed` or
/// `Failed` has been emitted; it is never restarted. Callers start a
/// new task instead.
pub struct DownloadTask {
    cancel: Arc<AtomicBool>,
    status: Arc<Mutex<TaskStatus>>,
}

impl DownloadTask {
    /// Begin the transfer on a background worker and return immediately
    /// with the task handle and its event stream.
    pub fn start(
        resolver: Arc<dyn Resolver>,
        video: VideoRef,
        dest_dir: PathBuf,
    ) -> (Self, UnboundedReceiver<DownloadEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let status = Arc::new(Mutex::new(TaskStatus::Idle));

        let worker_cancel = Arc::clone(&cancel);
        let worker_status = Arc::clone(&status);
        tokio::spawn(async move {
            set_status(&worker_status, TaskStatus::Running);

            match run_transfer(resolver, &video, &dest_dir, &worker_cancel, &tx).await {
                Ok(message) => {
                    set_status(&worker_status, TaskStatus::Completed);
                    let _ = tx.send(DownloadEvent::Completed(message));
                }
                Err(e) => {
                    warn!("Download of {} failed: {}", video.url, e);
                    set_status(&worker_status, TaskStatus::Failed);
                    let _ = tx.send(DownloadEvent::Failed(e.to_string()));
                }
            }
        });

        (Self { cancel, status }, rx)
    }

    /// Request cooperative cancellation; the worker notices between
    /// chunks and ends the task with a `Failed` event.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn status(&self) -> TaskStatus {
        self.status.lock().map(|s| *s).unwrap_or(TaskStatus::Failed)
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status(), TaskStatus::Idle | TaskStatus::Running)
    }
}

fn set_status(status: &Mutex<TaskStatus>, value: TaskStatus) {
    if let Ok(mut status) = status.lock() {
        *status = value;
    }
}

async fn run_transfer(
    resolver: Arc<dyn Resolver>,
    video: &VideoRef,
    dest_dir: &Path,
    cancel: &AtomicBool,
    tx: &UnboundedSender<DownloadEvent>,
) -> Result<String, DownloadError> {
    let stream = resolver.resolve(&video.url).await?;

    let last_sent = Mutex::new(None::<u8>);
    let on_progress = |bytes_written: u64, total_bytes: u64| {
        let percent = percent_complete(bytes_written, total_bytes);
        if let Ok(mut last) = last_sent.lock() {
            if last.is_none_or(|previous| percent > previous) {
                *last = Some(percent);
                let _ = tx.send(DownloadEvent::Progress(percent));
            }
        }
    };

    let path = resolver
        .transfer(&stream, dest_dir, cancel, &on_progress)
        .await?;
    info!("Download finished: {}", path.display());

    Ok(format!(
        "Video '{}' downloaded successfully in:\n{}",
        stream.title,
        dest_dir.display()
    ))
}
