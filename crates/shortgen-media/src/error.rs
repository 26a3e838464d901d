//! Media error types.

use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Attempt timed out after {timeout_secs}s: {url}")]
    AttemptTimedOut { url: String, timeout_secs: u64 },

    #[error("No satisfying-video candidates for category: {0}")]
    NoCandidates(String),

    #[error("Illustration search failed: {0}")]
    SearchFailed(String),

    #[error("yt-dlp not found in PATH")]
    YtDlpNotFound,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] shortgen_storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MediaError {
    pub fn download_failed(msg: impl Into<String>) -> Self {
        Self::DownloadFailed(msg.into())
    }

    pub fn search_failed(msg: impl Into<String>) -> Self {
        Self::SearchFailed(msg.into())
    }
}
