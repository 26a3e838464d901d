//! Queue error types.

use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Submit failed: {0}")]
    SubmitFailed(String),

    #[error("Render failed: {0}")]
    RenderFailed(String),

    #[error("Event stream closed before job {0} finished")]
    EventStreamClosed(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QueueError {
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed(msg.into())
    }

    pub fn submit_failed(msg: impl Into<String>) -> Self {
        Self::SubmitFailed(msg.into())
    }
}
