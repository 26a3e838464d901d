//! The compiled output document handed to the render worker.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::persona::PersonaGroupConfig;
use crate::sentence::ScriptSentence;
use crate::topic::FullTopicContext;

/// Production encoding tier.
pub const PRODUCTION_FPS: u32 = 30;
pub const PRODUCTION_WIDTH: u32 = 1080;
pub const PRODUCTION_HEIGHT: u32 = 1920;

/// Preview encoding tier, cheap enough for local iteration.
pub const PREVIEW_FPS: u32 = 15;
pub const PREVIEW_WIDTH: u32 = 540;
pub const PREVIEW_HEIGHT: u32 = 960;

/// Render quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    #[default]
    Preview,
    Production,
}

impl Quality {
    /// Resolve the tier from environment-derived policy: a production
    /// deployment always renders at full quality, otherwise an explicit
    /// override may force it, and the default is the preview tier.
    pub fn resolve(production_env: bool, quality_override: bool) -> Self {
        if production_env || quality_override {
            Quality::Production
        } else {
            Quality::Preview
        }
    }
}

/// Video encoding parameters selected by the quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderSettings {
    pub fps: u32,
    pub width: u32,
    pub height: u32,
}

impl RenderSettings {
    pub fn for_quality(quality: Quality) -> Self {
        match quality {
            Quality::Production => Self {
                fps: PRODUCTION_FPS,
                width: PRODUCTION_WIDTH,
                height: PRODUCTION_HEIGHT,
            },
            Quality::Preview => Self {
                fps: PREVIEW_FPS,
                width: PREVIEW_WIDTH,
                height: PREVIEW_HEIGHT,
            },
        }
    }
}

/// The final immutable document describing one video.
///
/// Written once as `{folder}/config.json`; the render worker reads it and the
/// media it references from the same folder.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    /// The run seed every random choice was derived from
    pub seed: f64,
    pub render: RenderSettings,
    /// Storage key of the background satisfying-video clip
    pub satisfying_video: String,
    /// Uniform cast shape: a single persona is a one-member group
    pub cast: PersonaGroupConfig,
    pub topic: FullTopicContext,
    pub sentences: Vec<ScriptSentence>,
}
