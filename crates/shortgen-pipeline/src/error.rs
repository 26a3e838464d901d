//! Pipeline error types.
//!
//! Lookup and validation errors are fatal and immediate. Network errors are
//! retried inside the media crate's budget before they surface here. A render
//! failure is terminal for the run and is never retried.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Lookup error: {0}")]
    Lookup(#[from] shortgen_models::LookupError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Upstream response parse failed: {0}")]
    UpstreamParse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Media acquisition failed: {0}")]
    Media(#[from] shortgen_media::MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] shortgen_storage::StorageError),

    #[error("Job dispatch failed: {0}")]
    Dispatch(String),

    #[error("Render failed: {0}")]
    RenderFailed(String),

    #[error("Publish failed: {0}")]
    Publish(String),
}

impl PipelineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn upstream_parse(msg: impl Into<String>) -> Self {
        Self::UpstreamParse(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    pub fn dispatch(msg: impl Into<String>) -> Self {
        Self::Dispatch(msg.into())
    }

    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }
}
