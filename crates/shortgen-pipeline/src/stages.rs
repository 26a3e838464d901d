//! Concurrent stage coordinator.
//!
//! Three independent stages run against the same sentence sequence and
//! output folder: illustration acquisition, satisfying-video acquisition and
//! speech synthesis. They are joined with `try_join!`, so the first failure
//! cancels the join and drops the sibling futures; none of their partial
//! results survive. Each stage returns its own result structure and the
//! merge happens once after the join — the sentence sequence itself is never
//! shared mutable state.

use std::collections::HashSet;
use std::future::Future;

use futures_util::future::try_join_all;
use tokio::sync::Mutex;
use tracing::info;

use shortgen_media::{
    download_satisfying_segment, select_segment, select_video, Fetcher, MediaError, PexelsClient,
    SatisfyingSource,
};
use shortgen_models::{
    artifacts, IllustrationVideo, PersonaGroupConfig, ScriptSentence, WordTiming,
};
use shortgen_storage::{get_json, ObjectStore};

use crate::compile::speaking_persona;
use crate::config::{PipelineConfig, RunMode, StageConcurrency};
use crate::error::{PipelineError, PipelineResult};
use crate::tts::SpeechSynthesizer;

/// Everything the stages borrow from the pipeline.
pub struct StageServices<'a> {
    pub store: &'a dyn ObjectStore,
    pub fetcher: &'a Fetcher,
    /// Illustration search client; required in online mode
    pub pexels: Option<&'a PexelsClient>,
    /// Speech backend; required in online mode
    pub synthesizer: Option<&'a dyn SpeechSynthesizer>,
    pub catalog: &'a [SatisfyingSource],
}

/// Per-stage results, merged once after the join.
#[derive(Debug)]
pub struct StageOutputs {
    /// One illustration per sentence, in sentence order
    pub illustrations: Vec<IllustrationVideo>,
    /// Storage key of the satisfying-video clip
    pub satisfying_video: String,
    /// One word alignment per sentence, in sentence order
    pub alignments: Vec<Vec<WordTiming>>,
}

/// Run the three generation stages concurrently.
///
/// Suspends until all three complete; the first failure wins and surfaces to
/// the run.
pub async fn run_generation_stages(
    services: &StageServices<'_>,
    config: &PipelineConfig,
    cast: &PersonaGroupConfig,
    sentences: &[ScriptSentence],
    folder: &str,
    seed: f64,
) -> PipelineResult<StageOutputs> {
    info!(count = sentences.len(), "Downloading illustrations");
    info!("Downloading satisfying video");
    info!("Synthesizing speech");

    let (illustrations, satisfying_video, alignments) = tokio::try_join!(
        illustrations_stage(services, config, sentences, folder),
        satisfying_stage(services, config, cast, folder, seed),
        speech_stage(services, config, cast, sentences, folder),
    )?;

    Ok(StageOutputs {
        illustrations,
        satisfying_video,
        alignments,
    })
}

/// Attach the per-stage outputs to the sentence sequence.
pub fn merge_stage_outputs(
    mut sentences: Vec<ScriptSentence>,
    illustrations: Vec<IllustrationVideo>,
    alignments: Vec<Vec<WordTiming>>,
) -> Vec<ScriptSentence> {
    for ((sentence, illustration), alignment) in
        sentences.iter_mut().zip(illustrations).zip(alignments)
    {
        sentence.illustration_video = Some(illustration);
        sentence.words_alignment = alignment;
    }
    sentences
}

/// Apply the configured execution mode to a per-sentence operation.
///
/// Sequential mode starts item `i+1` only after item `i` completed and the
/// cooldown elapsed. The cooldown exists to respect an external rate limit,
/// so the offline fixture path skips it.
async fn for_each_sentence<'a, F, Fut, T>(
    config: &PipelineConfig,
    sentences: &'a [ScriptSentence],
    op: F,
) -> PipelineResult<Vec<T>>
where
    F: Fn(usize, &'a ScriptSentence) -> Fut,
    Fut: Future<Output = PipelineResult<T>>,
{
    match config.concurrency {
        StageConcurrency::Parallel => {
            try_join_all(sentences.iter().enumerate().map(|(i, s)| op(i, s))).await
        }
        StageConcurrency::Sequential => {
            let mut results = Vec::with_capacity(sentences.len());
            for (i, sentence) in sentences.iter().enumerate() {
                if i > 0 && config.mode == RunMode::Online {
                    tokio::time::sleep(config.sequential_cooldown).await;
                }
                results.push(op(i, sentence).await?);
            }
            Ok(results)
        }
    }
}

async fn illustrations_stage(
    services: &StageServices<'_>,
    config: &PipelineConfig,
    sentences: &[ScriptSentence],
    folder: &str,
) -> PipelineResult<Vec<IllustrationVideo>> {
    match config.mode {
        RunMode::Offline => {
            let mut illustrations = Vec::with_capacity(sentences.len());
            for n in 1..=sentences.len() {
                let bytes = services
                    .store
                    .get(&artifacts::fixtures::illustration_key(n))
                    .await?;
                let key = artifacts::illustration_key(folder, n);
                services.store.put(&key, bytes, "video/mp4").await?;
                illustrations.push(IllustrationVideo {
                    id: n as u64,
                    quality: "sd".to_string(),
                    file_type: "video/mp4".to_string(),
                    width: Some(540),
                    height: Some(960),
                    link: key,
                    fps: Some(30.0),
                });
            }
            Ok(illustrations)
        }
        RunMode::Online => {
            let pexels = services.pexels.ok_or_else(|| {
                PipelineError::validation("online mode requires an illustration search client")
            })?;
            let used_ids: Mutex<HashSet<u64>> = Mutex::new(HashSet::new());

            for_each_sentence(config, sentences, |i, sentence| {
                let used_ids = &used_ids;
                async move {
                    let n = i + 1;
                    let videos = pexels.search(&sentence.illustration).await?;

                    let selected = {
                        let mut used = used_ids.lock().await;
                        let Some((video_id, file)) = select_video(&videos, &used) else {
                            return Err(PipelineError::Media(MediaError::search_failed(
                                format!(
                                    "no unused illustration candidates for '{}'",
                                    sentence.illustration
                                ),
                            )));
                        };
                        used.insert(video_id);
                        file
                    };

                    services
                        .fetcher
                        .fetch_to_store(
                            services.store,
                            &selected.link,
                            &artifacts::illustration_key(folder, n),
                            "video/mp4",
                        )
                        .await?;

                    Ok(selected)
                }
            })
            .await
        }
    }
}

async fn satisfying_stage(
    services: &StageServices<'_>,
    config: &PipelineConfig,
    cast: &PersonaGroupConfig,
    folder: &str,
    seed: f64,
) -> PipelineResult<String> {
    match config.mode {
        RunMode::Offline => {
            let bytes = services
                .store
                .get(&artifacts::fixtures::satisfying_key())
                .await?;
            let key = artifacts::satisfying_key(folder);
            services.store.put(&key, bytes, "video/webm").await?;
            Ok(key)
        }
        RunMode::Online => {
            let segment = select_segment(seed, &cast.theme, services.catalog)?;
            info!(
                source = %segment.source_id,
                start = %segment.start_hms(),
                end = %segment.end_hms(),
                "Selected satisfying segment"
            );
            Ok(download_satisfying_segment(
                services.store,
                folder,
                &segment,
                services.fetcher.config(),
            )
            .await?)
        }
    }
}

async fn speech_stage(
    services: &StageServices<'_>,
    config: &PipelineConfig,
    cast: &PersonaGroupConfig,
    sentences: &[ScriptSentence],
    folder: &str,
) -> PipelineResult<Vec<Vec<WordTiming>>> {
    for_each_sentence(config, sentences, |i, sentence| async move {
        let n = i + 1;
        let persona = speaking_persona(cast, sentence, i)?;

        match config.mode {
            RunMode::Offline => {
                let audio = services
                    .store
                    .get(&artifacts::fixtures::sentence_audio_key(n))
                    .await?;
                services
                    .store
                    .put(&artifacts::sentence_audio_key(folder, n), audio, "audio/ogg")
                    .await?;
                let alignment: Vec<WordTiming> =
                    get_json(services.store, &artifacts::fixtures::sentence_subs_key(n)).await?;
                Ok(alignment)
            }
            RunMode::Online => {
                let synthesizer = services.synthesizer.ok_or_else(|| {
                    PipelineError::validation("online mode requires a speech synthesizer")
                })?;
                let speech = synthesizer.synthesize(&sentence.text, persona).await?;
                services
                    .store
                    .put(
                        &artifacts::sentence_audio_key(folder, n),
                        speech.audio,
                        "audio/ogg",
                    )
                    .await?;
                Ok(speech.alignment)
            }
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use shortgen_media::FetchConfig;
    use shortgen_models::{PersonaRegistry, Cast};
    use shortgen_storage::{put_json, LocalStore};

    fn offline_config() -> PipelineConfig {
        PipelineConfig::default()
    }

    fn sentences() -> Vec<ScriptSentence> {
        vec![
            ScriptSentence::new("Pigeons are tiny landlords.", "angry", "city pigeons"),
            ScriptSentence::new("They own every ledge.", "smug", "building ledge"),
        ]
    }

    fn solo_cast() -> PersonaGroupConfig {
        match PersonaRegistry::builtin().resolve("maxwell").unwrap() {
            Cast::Persona(p) => PersonaGroupConfig::solo(p),
            Cast::Group(_) => unreachable!(),
        }
    }

    async fn seed_fixtures(store: &LocalStore, count: usize) {
        for n in 1..=count {
            store
                .put(
                    &artifacts::fixtures::sentence_audio_key(n),
                    format!("audio {n}").into_bytes(),
                    "audio/ogg",
                )
                .await
                .unwrap();
            put_json(
                store,
                &artifacts::fixtures::sentence_subs_key(n),
                &vec![WordTiming {
                    text: format!("word{n}"),
                    start: 0.0,
                    end: 0.4,
                }],
            )
            .await
            .unwrap();
            store
                .put(
                    &artifacts::fixtures::illustration_key(n),
                    format!("clip {n}").into_bytes(),
                    "video/mp4",
                )
                .await
                .unwrap();
        }
        store
            .put(
                &artifacts::fixtures::satisfying_key(),
                b"background loop".to_vec(),
                "video/webm",
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn offline_stages_populate_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        seed_fixtures(&store, 2).await;

        let fetcher = Fetcher::new(FetchConfig::default());
        let services = StageServices {
            store: &store,
            fetcher: &fetcher,
            pexels: None,
            synthesizer: None,
            catalog: &[],
        };

        let sentences = sentences();
        let outputs = run_generation_stages(
            &services,
            &offline_config(),
            &solo_cast(),
            &sentences,
            "output/test-run",
            0.5,
        )
        .await
        .unwrap();

        assert_eq!(outputs.illustrations.len(), 2);
        assert_eq!(outputs.alignments.len(), 2);
        assert_eq!(outputs.satisfying_video, "output/test-run/satisfying.webm");

        // Every artifact landed under the run folder.
        assert!(store.exists("output/test-run/sentence_1.ogg").await.unwrap());
        assert!(store.exists("output/test-run/sentence_2.ogg").await.unwrap());
        assert!(store
            .exists("output/test-run/sentence_1_illustration.mp4")
            .await
            .unwrap());
        assert!(store.exists("output/test-run/satisfying.webm").await.unwrap());
    }

    #[tokio::test]
    async fn missing_fixture_fails_the_join() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        seed_fixtures(&store, 1).await; // sentence 2 fixtures missing

        let fetcher = Fetcher::new(FetchConfig::default());
        let services = StageServices {
            store: &store,
            fetcher: &fetcher,
            pexels: None,
            synthesizer: None,
            catalog: &[],
        };

        let sentences = sentences();
        let result = run_generation_stages(
            &services,
            &offline_config(),
            &solo_cast(),
            &sentences,
            "output/test-run",
            0.5,
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn group_script_without_attribution_fails_speech_stage() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        seed_fixtures(&store, 1).await;

        let fetcher = Fetcher::new(FetchConfig::default());
        let services = StageServices {
            store: &store,
            fetcher: &fetcher,
            pexels: None,
            synthesizer: None,
            catalog: &[],
        };

        let group = PersonaRegistry::builtin()
            .get_group("maxwell_penny")
            .unwrap()
            .clone();
        let sentences = vec![ScriptSentence::new("Who said this?", "neutral", "mystery")];

        let err = run_generation_stages(
            &services,
            &offline_config(),
            &group,
            &sentences,
            "output/test-run",
            0.5,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[test]
    fn merge_attaches_disjoint_fields() {
        let sentences = sentences();
        let illustrations = vec![
            IllustrationVideo {
                id: 1,
                quality: "hd".to_string(),
                file_type: "video/mp4".to_string(),
                width: Some(1080),
                height: Some(1920),
                link: "https://example.com/1.mp4".to_string(),
                fps: Some(30.0),
            },
            IllustrationVideo {
                id: 2,
                quality: "hd".to_string(),
                file_type: "video/mp4".to_string(),
                width: Some(1080),
                height: Some(1920),
                link: "https://example.com/2.mp4".to_string(),
                fps: Some(30.0),
            },
        ];
        let alignments = vec![
            vec![WordTiming {
                text: "Pigeons".to_string(),
                start: 0.0,
                end: 0.5,
            }],
            vec![WordTiming {
                text: "They".to_string(),
                start: 0.0,
                end: 0.3,
            }],
        ];

        let merged = merge_stage_outputs(sentences, illustrations, alignments);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].illustration_video.as_ref().unwrap().id, 1);
        assert_eq!(merged[0].words_alignment[0].text, "Pigeons");
        assert_eq!(merged[1].illustration_video.as_ref().unwrap().id, 2);
        // The fields the generation step wrote are untouched.
        assert_eq!(merged[0].stance, "angry");
        assert_eq!(merged[1].illustration, "building ledge");
    }
}
