//! Publish hook, invoked only after a successful render.

use async_trait::async_trait;
use tracing::info;

use shortgen_models::VideoMetadata;

use crate::error::PipelineResult;

/// Narrow upload contract. OAuth and the hosting API live behind it.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, metadata: &VideoMetadata, render_key: &str) -> PipelineResult<()>;
}

/// Publisher that only logs. Used when no uploader is configured.
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    async fn publish(&self, metadata: &VideoMetadata, render_key: &str) -> PipelineResult<()> {
        info!(
            title = %metadata.title,
            render = %render_key,
            "Publish hook invoked (no uploader configured)"
        );
        Ok(())
    }
}
