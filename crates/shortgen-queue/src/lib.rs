//! Render job queue.
//!
//! This crate provides:
//! - Job submission via Redis Streams (one record per render job)
//! - A queue-layer retry policy recorded with each job
//! - Event-driven completion wait via Redis Pub/Sub

pub mod error;
pub mod events;
pub mod job;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use events::{RenderEvent, RenderEvents, RenderStatus};
pub use job::{BackoffKind, RenderVideoJob, RetryPolicy};
pub use queue::{wait_for_outcome, QueueConfig, RenderJobHandle, RenderQueue};
