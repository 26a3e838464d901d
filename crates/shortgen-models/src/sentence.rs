//! Script sentences and the per-stage data attached to them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One word of the synthesized speech with its timing window in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WordTiming {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// A candidate video file from illustration search (Pexels shape).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IllustrationVideo {
    pub id: u64,
    pub quality: String,
    pub file_type: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub link: String,
    pub fps: Option<f64>,
}

/// One spoken line of the script.
///
/// Sentences are produced as an ordered sequence by script generation. The
/// illustration and speech stages each contribute exactly one field
/// (`illustration_video` and `words_alignment`); the stages return those
/// fields as separate per-stage outputs that are merged once after the
/// fan-out join, so the sequence itself is never shared mutable state.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScriptSentence {
    /// The spoken line
    #[serde(rename = "sentence")]
    pub text: String,
    /// Emotional stance; must belong to the speaking persona's stance set
    pub stance: String,
    /// Illustration search term
    pub illustration: String,
    /// Resolved illustration video, populated by the illustration stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub illustration_video: Option<IllustrationVideo>,
    /// Originating persona; required when a persona group speaks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<String>,
    /// Word-level alignment, populated by the speech stage
    #[serde(default)]
    pub words_alignment: Vec<WordTiming>,
}

impl ScriptSentence {
    /// A freshly generated sentence with no stage data attached yet.
    pub fn new(
        text: impl Into<String>,
        stance: impl Into<String>,
        illustration: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            stance: stance.into(),
            illustration: illustration.into(),
            illustration_video: None,
            persona_id: None,
            words_alignment: Vec::new(),
        }
    }

    /// Attribute the sentence to a persona (group scripts).
    pub fn with_persona(mut self, persona_id: impl Into<String>) -> Self {
        self.persona_id = Some(persona_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_serde_roundtrip() {
        let sentence = ScriptSentence::new("Hello there.", "happy", "waving hands")
            .with_persona("maxwell");

        let json = serde_json::to_string(&sentence).expect("serialize sentence");
        assert!(json.contains("\"sentence\""));
        assert!(json.contains("\"personaId\""));
        assert!(json.contains("\"wordsAlignment\""));

        let decoded: ScriptSentence = serde_json::from_str(&json).expect("deserialize sentence");
        assert_eq!(decoded.text, sentence.text);
        assert_eq!(decoded.persona_id.as_deref(), Some("maxwell"));
        assert!(decoded.illustration_video.is_none());
    }

    #[test]
    fn sentence_deserializes_without_stage_fields() {
        // Shape emitted by script generation, before any stage ran.
        let json = r#"{"sentence":"Hi","stance":"neutral","illustration":"city"}"#;
        let decoded: ScriptSentence = serde_json::from_str(json).expect("deserialize");
        assert!(decoded.words_alignment.is_empty());
        assert!(decoded.illustration_video.is_none());
        assert!(decoded.persona_id.is_none());
    }
}
