//! Network media acquisition for the ShortGen pipeline.
//!
//! This crate provides:
//! - A retrying fetcher with per-attempt timeout and monotone backoff
//! - The satisfying-video catalog and deterministic segment selector
//! - Pexels illustration search and candidate file selection
//! - yt-dlp section download for satisfying-video clips

pub mod catalog;
pub mod error;
pub mod fetch;
pub mod illustration;
pub mod satisfying;

pub use catalog::{
    builtin_catalog, select_segment, SatisfyingSegment, SatisfyingSource, CLIP_LENGTH_SECS,
};
pub use error::{MediaError, MediaResult};
pub use fetch::{with_retries, FetchConfig, Fetcher};
pub use illustration::{
    select_video, PexelsClient, PexelsVideo, PexelsVideoFile, MIN_ILLUSTRATION_HEIGHT,
    MIN_ILLUSTRATION_WIDTH,
};
pub use satisfying::download_satisfying_segment;
