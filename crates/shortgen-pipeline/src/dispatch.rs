//! Render job dispatch and completion wait.

use async_trait::async_trait;
use tracing::info;

use shortgen_queue::{QueueError, RenderEvents, RenderQueue, RenderVideoJob, RetryPolicy};

use crate::error::{PipelineError, PipelineResult};

/// Dispatch seam between the pipeline and the queue infrastructure.
#[async_trait]
pub trait RenderDispatcher: Send + Sync {
    /// Submit the job and block until the worker reports a terminal state.
    ///
    /// Rejects with `RenderFailed` when the worker reports failure; any
    /// other queue problem is a dispatch error. The pipeline never
    /// re-submits either way.
    async fn dispatch_and_wait(&self, job: RenderVideoJob) -> PipelineResult<()>;
}

/// Dispatcher backed by the Redis render queue.
pub struct QueueDispatcher {
    queue: RenderQueue,
    events: RenderEvents,
    policy: RetryPolicy,
}

impl QueueDispatcher {
    pub fn new(queue: RenderQueue, events: RenderEvents) -> Self {
        Self {
            queue,
            events,
            policy: RetryPolicy::default(),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> PipelineResult<Self> {
        let queue = RenderQueue::from_env().map_err(|e| PipelineError::dispatch(e.to_string()))?;
        let events =
            RenderEvents::from_env().map_err(|e| PipelineError::dispatch(e.to_string()))?;
        Ok(Self::new(queue, events))
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl RenderDispatcher for QueueDispatcher {
    async fn dispatch_and_wait(&self, job: RenderVideoJob) -> PipelineResult<()> {
        let handle = self
            .queue
            .submit(job, self.policy.clone())
            .await
            .map_err(|e| PipelineError::dispatch(e.to_string()))?;

        info!(job_id = %handle.job_id, "Waiting for render to complete");

        match handle.wait_until_finished(&self.events).await {
            Ok(()) => Ok(()),
            Err(QueueError::RenderFailed(reason)) => Err(PipelineError::RenderFailed(reason)),
            Err(e) => Err(PipelineError::dispatch(e.to_string())),
        }
    }
}
