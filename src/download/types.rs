use crate::utils::sanitize_file_name;

/// A retrievable stream variant picked during resolution: the direct
/// media URL plus what is needed to name the file and report progress.
#[derive(Debug, Clone)]
pub struct ResolvedStream {
    pub media_url: String,
    /// Total payload size in bytes; 0 when the resolver could not learn
    /// it up front, in which case the transfer falls back to the
    /// response's content length.
    pub total_bytes: u64,
    pub title: String,
    pub ext: String,
}

impl ResolvedStream {
    /// Default naming: title plus extension, with characters the
    /// filesystem rejects replaced.
    pub fn file_name(&self) -> String {
        format!("{}.{}", sanitize_file_name(&self.title), self.ext)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Events a download task emits over its lifetime: zero or more
/// `Progress` values in non-decreasing order, then exactly one
/// `Completed` or `Failed`, and nothing after that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    Progress(u8),
    Completed(String),
    Failed(String),
}

/// Whole percent completed, floored and clamped to 0..=100.
pub fn percent_complete(bytes_written: u64, total_bytes: u64) -> u8 {
    if total_bytes == 0 {
        return 0;
    }
    let percent = bytes_written.saturating_mul(100) / total_bytes;
    percent.min(100) as u8
}
