//! Output-config compilation and validation.

use tracing::info;

use shortgen_models::{
    artifacts, Cast, FullTopicContext, OutputConfig, PersonaConfig, PersonaGroupConfig, Quality,
    RenderSettings, ScriptSentence,
};
use shortgen_storage::{put_json, ObjectStore};

use crate::error::{PipelineError, PipelineResult};

/// Resolve the persona speaking a sentence within the cast.
///
/// A sentence without attribution is only valid for a one-member cast; a
/// group script must attribute every sentence to a resolvable member.
pub(crate) fn speaking_persona<'a>(
    cast: &'a PersonaGroupConfig,
    sentence: &ScriptSentence,
    index: usize,
) -> PipelineResult<&'a PersonaConfig> {
    match &sentence.persona_id {
        Some(id) => cast.member(id).ok_or_else(|| {
            PipelineError::validation(format!(
                "sentence {} references unknown persona '{}'",
                index + 1,
                id
            ))
        }),
        None if cast.members.len() == 1 => Ok(&cast.members[0]),
        None => Err(PipelineError::validation(format!(
            "sentence {} is missing persona attribution for a group script",
            index + 1
        ))),
    }
}

/// Merge the run's data into the final output document.
///
/// Normalizes a single persona into a one-member group, then validates every
/// sentence: its persona must resolve within the cast and its stance must be
/// one the persona supports. Fails fast on the first invalid sentence; no
/// document is produced for an invalid sentence set.
pub fn compile_output_config(
    seed: f64,
    cast: Cast,
    sentences: Vec<ScriptSentence>,
    satisfying_video: String,
    topic: FullTopicContext,
    quality: Quality,
) -> PipelineResult<OutputConfig> {
    let cast = cast.into_group();

    for (index, sentence) in sentences.iter().enumerate() {
        let persona = speaking_persona(&cast, sentence, index)?;
        if !persona.supports_stance(&sentence.stance) {
            return Err(PipelineError::validation(format!(
                "sentence {}: persona '{}' does not support stance '{}'",
                index + 1,
                persona.id,
                sentence.stance
            )));
        }
    }

    Ok(OutputConfig {
        seed,
        render: RenderSettings::for_quality(quality),
        satisfying_video,
        cast,
        topic,
        sentences,
    })
}

/// Persist the compiled document as `{folder}/config.json`.
///
/// One serialized write; readers never observe a partial document.
pub async fn write_output_config(
    store: &dyn ObjectStore,
    folder: &str,
    config: &OutputConfig,
) -> PipelineResult<String> {
    let key = artifacts::config_key(folder);
    put_json(store, &key, config).await?;
    info!(key = %key, sentences = config.sentences.len(), "Wrote output config");
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shortgen_models::PersonaRegistry;

    fn topic() -> FullTopicContext {
        FullTopicContext::bare("test topic", "Test!")
    }

    fn solo_cast() -> Cast {
        PersonaRegistry::builtin().resolve("maxwell").unwrap()
    }

    fn group_cast() -> Cast {
        PersonaRegistry::builtin().resolve("maxwell_penny").unwrap()
    }

    #[test]
    fn solo_persona_is_normalized_to_one_member_group() {
        let sentences = vec![ScriptSentence::new("Hello.", "angry", "waving")];

        let config = compile_output_config(
            0.42,
            solo_cast(),
            sentences,
            "output/run/satisfying.webm".to_string(),
            topic(),
            Quality::Preview,
        )
        .unwrap();

        assert_eq!(config.cast.members.len(), 1);
        assert_eq!(config.cast.members[0].id, "maxwell");
        assert_eq!(config.seed, 0.42);
        assert_eq!(config.render, RenderSettings::for_quality(Quality::Preview));
    }

    #[test]
    fn group_sentences_resolve_by_persona_id() {
        let sentences = vec![
            ScriptSentence::new("Rant!", "angry", "storm clouds").with_persona("maxwell"),
            ScriptSentence::new("Sure.", "smug", "raised eyebrow").with_persona("penny"),
        ];

        let config = compile_output_config(
            0.1,
            group_cast(),
            sentences,
            "output/run/satisfying.webm".to_string(),
            topic(),
            Quality::Production,
        )
        .unwrap();

        assert_eq!(config.cast.members.len(), 2);
        assert_eq!(config.render.width, 1080);
    }

    #[test]
    fn unknown_persona_fails_validation() {
        let sentences = vec![
            ScriptSentence::new("Rant!", "angry", "storm clouds").with_persona("maxwell"),
            ScriptSentence::new("Who?", "neutral", "question mark").with_persona("ghost"),
        ];

        let err = compile_output_config(
            0.1,
            group_cast(),
            sentences,
            "x".to_string(),
            topic(),
            Quality::Preview,
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::Validation(msg) if msg.contains("ghost")));
    }

    #[test]
    fn unsupported_stance_fails_validation() {
        // "sad" is not in maxwell's stance set.
        let sentences = vec![ScriptSentence::new("So sad.", "sad", "rain")];

        let err = compile_output_config(
            0.1,
            solo_cast(),
            sentences,
            "x".to_string(),
            topic(),
            Quality::Preview,
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::Validation(msg) if msg.contains("sad")));
    }

    #[test]
    fn group_sentence_without_attribution_fails_validation() {
        let sentences = vec![ScriptSentence::new("Anonymous.", "neutral", "shadow")];

        let err = compile_output_config(
            0.1,
            group_cast(),
            sentences,
            "x".to_string(),
            topic(),
            Quality::Preview,
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[tokio::test]
    async fn written_config_roundtrips() {
        use shortgen_storage::{get_json, LocalStore};

        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        let sentences = vec![ScriptSentence::new("Hello.", "happy", "sunrise")];
        let config = compile_output_config(
            0.9,
            solo_cast(),
            sentences,
            "output/run/satisfying.webm".to_string(),
            topic(),
            Quality::Preview,
        )
        .unwrap();

        let key = write_output_config(&store, "output/run", &config)
            .await
            .unwrap();
        assert_eq!(key, "output/run/config.json");

        let back: OutputConfig = get_json(&store, &key).await.unwrap();
        assert_eq!(back.seed, 0.9);
        assert_eq!(back.cast.members[0].id, "maxwell");
        assert_eq!(back.sentences.len(), 1);
    }
}
