//! Persona and persona-group configuration.
//!
//! Personas are immutable after construction and are resolved by name from a
//! [`PersonaRegistry`] built at process start. The registry is an explicit
//! value passed into the pipeline, not a process-wide global, so tests can
//! swap it wholesale.

use std::collections::{BTreeSet, HashMap};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::topic::NewsItem;

/// Result type for registry lookups.
pub type LookupResult<T> = Result<T, LookupError>;

/// Registry lookup errors. Always fatal for the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error("Unknown persona: {0}")]
    PersonaNotFound(String),

    #[error("Unknown persona group: {0}")]
    GroupNotFound(String),

    #[error("No persona or persona group named: {0}")]
    NameNotFound(String),
}

/// On-screen placement parameters for a persona.
///
/// The `group_*` values apply when the persona appears alongside others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersonaLayout {
    /// Relative character size
    pub size: f64,
    /// Horizontal position range when speaking alone
    pub x_range: [f64; 2],
    pub x_offset: f64,
    /// Horizontal position range inside a group shot
    pub group_x_range: [f64; 2],
    pub group_x_offset: f64,
}

/// The three prompt templates a persona carries.
///
/// Templates use `{personality}`, `{topic}` and `{news}` placeholders;
/// rendering is plain substitution, prompt content is owned by the persona
/// author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromptSet {
    /// Video metadata from recent news
    pub news_video: String,
    /// Video metadata for a random topic
    pub random_topic: String,
    /// Script-writing guidelines
    pub script_guidelines: String,
}

/// A named voice/personality configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersonaConfig {
    pub id: String,
    pub display_name: String,
    pub layout: PersonaLayout,
    /// Voice for the ElevenLabs synthesis backend
    pub eleven_labs_voice_id: String,
    /// Voice for the Kokoro synthesis backend
    pub kokoro_voice_id: String,
    /// Spoken-language tag, e.g. "en-US"
    pub language: String,
    /// Background theme name
    pub theme: String,
    /// Theme playback volume in [0, 1]
    pub theme_volume: f64,
    /// Free-text personality description fed into prompts
    pub personality: String,
    pub prompts: PromptSet,
    /// Emotional stances this persona can express
    pub stances: BTreeSet<String>,
}

impl PersonaConfig {
    /// Whether the persona can express the given stance.
    pub fn supports_stance(&self, stance: &str) -> bool {
        self.stances.contains(stance)
    }

    /// Render the news-video metadata prompt.
    pub fn news_video_prompt(&self, news: &[NewsItem]) -> String {
        let digest = news
            .iter()
            .map(|n| format!("- {}: {}", n.title, n.description))
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts
            .news_video
            .replace("{personality}", &self.personality)
            .replace("{news}", &digest)
    }

    /// Render the random-topic metadata prompt.
    pub fn random_topic_prompt(&self) -> String {
        self.prompts
            .random_topic
            .replace("{personality}", &self.personality)
    }

    /// Render the script-guideline prompt for a given topic.
    pub fn script_guidelines(&self, topic: &str) -> String {
        self.prompts
            .script_guidelines
            .replace("{personality}", &self.personality)
            .replace("{topic}", topic)
    }
}

/// Multiple personas sharing one dialogue context.
///
/// Members are full persona records, so a resolved group is self-contained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersonaGroupConfig {
    pub id: String,
    /// Shared conversation prompt driving the dialogue script
    pub conversation_prompt: String,
    pub theme: String,
    pub theme_volume: f64,
    pub members: Vec<PersonaConfig>,
}

impl PersonaGroupConfig {
    /// Normalize a single persona into a one-member group so downstream
    /// consumers always see a uniform group structure.
    pub fn solo(persona: PersonaConfig) -> Self {
        Self {
            id: persona.id.clone(),
            conversation_prompt: persona.personality.clone(),
            theme: persona.theme.clone(),
            theme_volume: persona.theme_volume,
            members: vec![persona],
        }
    }

    /// Find a member by persona id.
    pub fn member(&self, persona_id: &str) -> Option<&PersonaConfig> {
        self.members.iter().find(|p| p.id == persona_id)
    }
}

/// A resolved cast: either one persona or a persona group.
#[derive(Debug, Clone)]
pub enum Cast {
    Persona(PersonaConfig),
    Group(PersonaGroupConfig),
}

impl Cast {
    /// The uniform group shape every downstream consumer works with.
    pub fn into_group(self) -> PersonaGroupConfig {
        match self {
            Cast::Persona(p) => PersonaGroupConfig::solo(p),
            Cast::Group(g) => g,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Cast::Group(_))
    }
}

/// Read-only persona/group store, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct PersonaRegistry {
    personas: HashMap<String, PersonaConfig>,
    groups: HashMap<String, PersonaGroupConfig>,
}

impl PersonaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a persona under its id.
    pub fn with_persona(mut self, persona: PersonaConfig) -> Self {
        self.personas.insert(persona.id.clone(), persona);
        self
    }

    /// Add a group under its id.
    pub fn with_group(mut self, group: PersonaGroupConfig) -> Self {
        self.groups.insert(group.id.clone(), group);
        self
    }

    /// Look up a persona by name.
    pub fn get_persona(&self, name: &str) -> LookupResult<&PersonaConfig> {
        self.personas
            .get(name)
            .ok_or_else(|| LookupError::PersonaNotFound(name.to_string()))
    }

    /// Look up a persona group by name.
    pub fn get_group(&self, name: &str) -> LookupResult<&PersonaGroupConfig> {
        self.groups
            .get(name)
            .ok_or_else(|| LookupError::GroupNotFound(name.to_string()))
    }

    /// Resolve a name to a persona or, failing that, a group.
    pub fn resolve(&self, name: &str) -> LookupResult<Cast> {
        if let Some(p) = self.personas.get(name) {
            return Ok(Cast::Persona(p.clone()));
        }
        if let Some(g) = self.groups.get(name) {
            return Ok(Cast::Group(g.clone()));
        }
        Err(LookupError::NameNotFound(name.to_string()))
    }

    /// The registry shipped with the binary: two personas and the duo group.
    pub fn builtin() -> Self {
        let maxwell = PersonaConfig {
            id: "maxwell".to_string(),
            display_name: "Maxwell".to_string(),
            layout: PersonaLayout {
                size: 0.9,
                x_range: [0.25, 0.75],
                x_offset: 0.0,
                group_x_range: [0.1, 0.4],
                group_x_offset: -0.05,
            },
            eleven_labs_voice_id: "pNInz6obpgDQGcFmaJgB".to_string(),
            kokoro_voice_id: "am_michael".to_string(),
            language: "en-US".to_string(),
            theme: "minecraft_parkour".to_string(),
            theme_volume: 0.12,
            personality: "A loud, perpetually outraged commentator who takes \
                          every headline personally and talks with his hands."
                .to_string(),
            prompts: PromptSet {
                news_video: "You are {personality}. Given these headlines:\n{news}\n\
                             Reply with JSON video metadata (title, description, hashtags)."
                    .to_string(),
                random_topic: "You are {personality}. Pick one absurd everyday topic and \
                               reply with JSON video metadata (title, description, hashtags)."
                    .to_string(),
                script_guidelines: "You are {personality}. Write a short vertical-video \
                                    monologue about {topic} as JSON sentences with \
                                    stance and illustration fields."
                    .to_string(),
            },
            stances: ["neutral", "angry", "happy", "shocked", "smug"]
                .into_iter()
                .map(String::from)
                .collect(),
        };

        let penny = PersonaConfig {
            id: "penny".to_string(),
            display_name: "Penny".to_string(),
            layout: PersonaLayout {
                size: 0.85,
                x_range: [0.25, 0.75],
                x_offset: 0.0,
                group_x_range: [0.6, 0.9],
                group_x_offset: 0.05,
            },
            eleven_labs_voice_id: "EXAVITQu4vr4xnSDxMaL".to_string(),
            kokoro_voice_id: "af_heart".to_string(),
            language: "en-US".to_string(),
            theme: "soap_cutting".to_string(),
            theme_volume: 0.1,
            personality: "A deadpan skeptic who deflates her friend's outrage \
                          with one-liners and reluctant curiosity."
                .to_string(),
            prompts: PromptSet {
                news_video: "You are {personality}. Given these headlines:\n{news}\n\
                             Reply with JSON video metadata (title, description, hashtags)."
                    .to_string(),
                random_topic: "You are {personality}. Pick one oddly specific topic and \
                               reply with JSON video metadata (title, description, hashtags)."
                    .to_string(),
                script_guidelines: "You are {personality}. Write a short vertical-video \
                                    monologue about {topic} as JSON sentences with \
                                    stance and illustration fields."
                    .to_string(),
            },
            stances: ["neutral", "happy", "sad", "shocked", "smug"]
                .into_iter()
                .map(String::from)
                .collect(),
        };

        let duo = PersonaGroupConfig {
            id: "maxwell_penny".to_string(),
            conversation_prompt: "Maxwell rants about the topic while Penny keeps \
                                  puncturing the rant; they trade short lines and \
                                  land on a reluctant agreement."
                .to_string(),
            theme: "minecraft_parkour".to_string(),
            theme_volume: 0.1,
            members: vec![maxwell.clone(), penny.clone()],
        };

        Self::new()
            .with_persona(maxwell)
            .with_persona(penny)
            .with_group(duo)
    }
}
