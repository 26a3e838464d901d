//! Shared data models for the ShortGen pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Personas, persona groups and the registry they are resolved from
//! - Topics and video metadata
//! - Script sentences with per-stage enrichment fields
//! - The compiled output document handed to the render worker
//! - Artifact key layout and timestamp formatting

pub mod artifacts;
pub mod job;
pub mod output;
pub mod persona;
pub mod sentence;
pub mod timestamp;
pub mod topic;

// Re-export common types
pub use job::JobId;
pub use output::{OutputConfig, Quality, RenderSettings};
pub use persona::{
    Cast, LookupError, LookupResult, PersonaConfig, PersonaGroupConfig, PersonaLayout,
    PersonaRegistry, PromptSet,
};
pub use sentence::{IllustrationVideo, ScriptSentence, WordTiming};
pub use timestamp::{format_hms, parse_hms, TimestampError};
pub use topic::{FullTopicContext, NewsItem, VideoMetadata};
