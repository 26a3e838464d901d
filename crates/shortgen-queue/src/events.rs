//! Render lifecycle events via Redis Pub/Sub.
//!
//! The render worker is the sole publisher; the pipeline's completion wait is
//! the subscriber. One channel per job.

use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::debug;

use shortgen_models::JobId;

use crate::error::QueueResult;

/// Lifecycle status of a render job.
///
/// `Submitted → (Queued → Active)* → Completed | Failed`; only the last two
/// are terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderStatus {
    Queued,
    Active { progress: u8 },
    Completed,
    Failed { reason: String },
}

impl RenderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RenderStatus::Completed | RenderStatus::Failed { .. })
    }
}

/// One event published on a job's channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderEvent {
    pub job_id: JobId,
    #[serde(flatten)]
    pub status: RenderStatus,
}

/// Pub/Sub channel for render lifecycle events.
pub struct RenderEvents {
    client: redis::Client,
}

impl RenderEvents {
    pub fn new(redis_url: &str) -> QueueResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Create from the `REDIS_URL` environment variable.
    pub fn from_env() -> QueueResult<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        Self::new(&url)
    }

    /// Get the channel name for a job.
    pub fn channel_name(job_id: &JobId) -> String {
        format!("render:{}", job_id)
    }

    /// Publish an event on the job's channel.
    pub async fn publish(&self, event: &RenderEvent) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let channel = Self::channel_name(&event.job_id);
        let payload = serde_json::to_string(event)?;

        debug!("Publishing render event to {}", channel);
        conn.publish::<_, _, ()>(channel, payload).await?;

        Ok(())
    }

    /// Publish a progress update.
    pub async fn active(&self, job_id: &JobId, progress: u8) -> QueueResult<()> {
        self.publish(&RenderEvent {
            job_id: job_id.clone(),
            status: RenderStatus::Active {
                progress: progress.min(100),
            },
        })
        .await
    }

    /// Publish successful completion.
    pub async fn completed(&self, job_id: &JobId) -> QueueResult<()> {
        self.publish(&RenderEvent {
            job_id: job_id.clone(),
            status: RenderStatus::Completed,
        })
        .await
    }

    /// Publish terminal failure with the worker's reason.
    pub async fn failed(&self, job_id: &JobId, reason: impl Into<String>) -> QueueResult<()> {
        self.publish(&RenderEvent {
            job_id: job_id.clone(),
            status: RenderStatus::Failed {
                reason: reason.into(),
            },
        })
        .await
    }

    /// Subscribe to events for a job.
    /// Returns a pinned stream that can be polled with `.next()`.
    pub async fn subscribe(
        &self,
        job_id: &JobId,
    ) -> QueueResult<std::pin::Pin<Box<dyn futures_util::Stream<Item = RenderEvent> + Send>>> {
        use futures_util::StreamExt;

        let mut pubsub = self.client.get_async_pubsub().await?;
        let channel = Self::channel_name(job_id);

        pubsub.subscribe(&channel).await?;

        let stream = pubsub.into_on_message().filter_map(|msg| async move {
            let payload: String = msg.get_payload().ok()?;
            serde_json::from_str(&payload).ok()
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serde_tags_status() {
        let event = RenderEvent {
            job_id: JobId::from_string("job-1"),
            status: RenderStatus::Failed {
                reason: "ffmpeg exited 1".to_string(),
            },
        };

        let json = serde_json::to_string(&event).expect("serialize event");
        assert!(json.contains("\"status\":\"failed\""));
        assert!(json.contains("ffmpeg exited 1"));

        let decoded: RenderEvent = serde_json::from_str(&json).expect("deserialize event");
        assert_eq!(decoded, event);
    }

    #[test]
    fn terminal_states() {
        assert!(RenderStatus::Completed.is_terminal());
        assert!(RenderStatus::Failed { reason: "x".into() }.is_terminal());
        assert!(!RenderStatus::Queued.is_terminal());
        assert!(!RenderStatus::Active { progress: 50 }.is_terminal());
    }
}
