//! Render job record and the queue-layer retry policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shortgen_models::JobId;

/// Backoff shape the queue infrastructure applies between its own retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    Exponential,
    Fixed,
}

/// Retry policy recorded with a submitted job.
///
/// The pipeline itself never re-submits: the default of one attempt means a
/// dispatch-layer failure is fatal to the run. The backoff parameters exist
/// for whatever retries the queue infrastructure performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts the queue may make
    pub attempts: u32,
    pub backoff: BackoffKind,
    pub backoff_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 1,
            backoff: BackoffKind::Exponential,
            backoff_delay_ms: 5_000,
        }
    }
}

/// Job record posted to the render queue.
///
/// References only the output folder; the render worker reads the compiled
/// config and media from that folder itself, so no large payload is inlined
/// here. `show_progress` and `fake_render` are opaque hints passed through to
/// the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderVideoJob {
    pub job_id: JobId,
    /// Output folder of the run; the worker's single input reference
    pub folder: String,
    #[serde(default)]
    pub show_progress: bool,
    #[serde(default)]
    pub fake_render: bool,
    pub created_at: DateTime<Utc>,
}

impl RenderVideoJob {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            job_id: JobId::new(),
            folder: folder.into(),
            show_progress: false,
            fake_render: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_fake_render(mut self, fake_render: bool) -> Self {
        self.fake_render = fake_render;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_job_serde_roundtrip() {
        let job = RenderVideoJob::new("output/20250101-120000-a1b2c3d4")
            .with_show_progress(true)
            .with_fake_render(false);

        let json = serde_json::to_string(&job).expect("serialize job");
        let decoded: RenderVideoJob = serde_json::from_str(&json).expect("deserialize job");

        assert_eq!(decoded.job_id, job.job_id);
        assert_eq!(decoded.folder, job.folder);
        assert!(decoded.show_progress);
        assert!(!decoded.fake_render);
        assert_eq!(decoded.created_at, job.created_at);
    }

    #[test]
    fn default_policy_is_single_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 1);
        assert_eq!(policy.backoff, BackoffKind::Exponential);
        assert_eq!(policy.backoff_delay_ms, 5_000);
    }

    #[test]
    fn hints_default_to_false_when_absent() {
        let json = r#"{
            "job_id": "abc",
            "folder": "output/run",
            "created_at": "2025-01-01T12:00:00Z"
        }"#;
        let decoded: RenderVideoJob = serde_json::from_str(json).expect("deserialize job");
        assert!(!decoded.show_progress);
        assert!(!decoded.fake_render);
    }
}
