//! Pipeline configuration.
//!
//! One explicit structure threaded through the entry point; every mode
//! switch is an enumerated option resolved once per run.

use std::time::Duration;

use shortgen_models::Quality;

/// Whether stages talk to the network or to pre-seeded fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Skip all network calls; stages read `assets/debug/…` fixtures.
    #[default]
    Offline,
    Online,
}

/// Execution mode of the per-sentence stages (illustrations, speech).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageConcurrency {
    /// Item `i+1` starts only after item `i` completed and the cooldown
    /// elapsed. Respects external rate limits.
    #[default]
    Sequential,
    /// All items launched at once.
    Parallel,
}

/// Which speech synthesis backend to use in online mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtsProvider {
    #[default]
    Kokoro,
    ElevenLabs,
}

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub mode: RunMode,
    pub concurrency: StageConcurrency,
    pub quality: Quality,
    pub tts_provider: TtsProvider,
    /// Cooldown between items in sequential mode
    pub sequential_cooldown: Duration,
    /// Opaque pass-through hint for the render worker
    pub show_progress: bool,
    /// Opaque pass-through hint for the render worker
    pub fake_render: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            concurrency: StageConcurrency::default(),
            quality: Quality::default(),
            tts_provider: TtsProvider::default(),
            sequential_cooldown: Duration::from_secs(61),
            show_progress: false,
            fake_render: false,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let production_env = std::env::var("SHORTGEN_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);
        let quality_override = std::env::var("SHORTGEN_QUALITY")
            .map(|v| v == "production")
            .unwrap_or(false);

        Self {
            mode: match std::env::var("SHORTGEN_MODE").as_deref() {
                Ok("online") => RunMode::Online,
                _ => RunMode::Offline,
            },
            concurrency: match std::env::var("SHORTGEN_CONCURRENCY").as_deref() {
                Ok("parallel") => StageConcurrency::Parallel,
                _ => StageConcurrency::Sequential,
            },
            quality: Quality::resolve(production_env, quality_override),
            tts_provider: match std::env::var("TTS_PROVIDER").as_deref() {
                Ok("elevenlabs") => TtsProvider::ElevenLabs,
                _ => TtsProvider::Kokoro,
            },
            sequential_cooldown: Duration::from_secs(
                std::env::var("SHORTGEN_COOLDOWN_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(61),
            ),
            show_progress: std::env::var("SHORTGEN_SHOW_PROGRESS")
                .map(|v| v == "true")
                .unwrap_or(false),
            fake_render: std::env::var("SHORTGEN_FAKE_RENDER")
                .map(|v| v == "true")
                .unwrap_or(false),
        }
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_concurrency(mut self, concurrency: StageConcurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_sequential_cooldown(mut self, cooldown: Duration) -> Self {
        self.sequential_cooldown = cooldown;
        self
    }
}
