//! Job submission and completion wait.

use futures_util::{Stream, StreamExt};
use tracing::{error, info};

use shortgen_models::JobId;

use crate::error::{QueueError, QueueResult};
use crate::events::{RenderEvent, RenderEvents, RenderStatus};
use crate::job::{RenderVideoJob, RetryPolicy};

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// Stream name render jobs are posted to
    pub stream_name: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            stream_name: "shortgen:render".to_string(),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            stream_name: std::env::var("RENDER_STREAM")
                .unwrap_or_else(|_| "shortgen:render".to_string()),
        }
    }
}

/// Render queue client.
pub struct RenderQueue {
    client: redis::Client,
    config: QueueConfig,
}

impl RenderQueue {
    /// Create a new render queue.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    /// Submit a render job with its retry policy.
    ///
    /// The returned handle exposes a single capability: waiting until the
    /// job finished.
    pub async fn submit(
        &self,
        job: RenderVideoJob,
        policy: RetryPolicy,
    ) -> QueueResult<RenderJobHandle> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(&job)?;
        let policy_payload = serde_json::to_string(&policy)?;

        let message_id: String = redis::cmd("XADD")
            .arg(&self.config.stream_name)
            .arg("*")
            .arg("job")
            .arg(&payload)
            .arg("retry_policy")
            .arg(&policy_payload)
            .query_async(&mut conn)
            .await?;

        info!(
            job_id = %job.job_id,
            folder = %job.folder,
            message_id = %message_id,
            "Submitted render job"
        );

        Ok(RenderJobHandle {
            job_id: job.job_id,
            message_id,
        })
    }
}

/// Opaque handle to a submitted render job.
#[derive(Debug, Clone)]
pub struct RenderJobHandle {
    pub job_id: JobId,
    pub message_id: String,
}

impl RenderJobHandle {
    /// Block until the render worker reports a terminal state.
    ///
    /// Event-driven: suspends on the job's Pub/Sub channel, no polling.
    /// Resolves on `Completed`; a `Failed` event rejects with the worker's
    /// reason.
    pub async fn wait_until_finished(&self, events: &RenderEvents) -> QueueResult<()> {
        let stream = events.subscribe(&self.job_id).await?;
        wait_for_outcome(&self.job_id, stream).await
    }
}

/// Drive an event stream to the job's terminal state.
///
/// Non-terminal events (`Queued`, `Active`) are consumed and waited through.
pub async fn wait_for_outcome(
    job_id: &JobId,
    stream: impl Stream<Item = RenderEvent>,
) -> QueueResult<()> {
    futures_util::pin_mut!(stream);

    while let Some(event) = stream.next().await {
        if event.job_id != *job_id {
            continue;
        }
        match event.status {
            RenderStatus::Completed => {
                info!(job_id = %job_id, "Render job completed");
                return Ok(());
            }
            RenderStatus::Failed { reason } => {
                error!(job_id = %job_id, reason = %reason, "Render job failed");
                return Err(QueueError::RenderFailed(reason));
            }
            RenderStatus::Queued | RenderStatus::Active { .. } => {}
        }
    }

    Err(QueueError::EventStreamClosed(job_id.to_string()))
}
