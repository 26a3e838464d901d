//! The full pipeline run for one video.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use shortgen_media::{builtin_catalog, FetchConfig, Fetcher, PexelsClient, SatisfyingSource};
use shortgen_models::{artifacts, Cast, PersonaConfig, PersonaRegistry};
use shortgen_queue::RenderVideoJob;
use shortgen_storage::ObjectStore;

use crate::compile::{compile_output_config, write_output_config};
use crate::config::PipelineConfig;
use crate::dispatch::RenderDispatcher;
use crate::error::{PipelineError, PipelineResult};
use crate::publish::Publisher;
use crate::script::ScriptSource;
use crate::stages::{merge_stage_outputs, run_generation_stages, StageServices};
use crate::tts::SpeechSynthesizer;

/// Unique output folder for one run: timestamp plus random suffix.
///
/// The folder is the single addressing key for every artifact the run
/// produces; uniqueness is what keeps concurrent runs apart, no locking.
pub fn unique_run_folder() -> String {
    let stamp = Utc::now().format("%Y%m%d-%H%M%S");
    let suffix: u32 = rand::random();
    format!("output/{stamp}-{suffix:08x}")
}

/// One pipeline instance, wired once at startup and good for one run per
/// invocation.
pub struct Pipeline {
    config: PipelineConfig,
    registry: PersonaRegistry,
    store: Arc<dyn ObjectStore>,
    fetcher: Fetcher,
    catalog: Vec<SatisfyingSource>,
    script_source: Arc<dyn ScriptSource>,
    pexels: Option<PexelsClient>,
    synthesizer: Option<Box<dyn SpeechSynthesizer>>,
    dispatcher: Arc<dyn RenderDispatcher>,
    publisher: Arc<dyn Publisher>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        registry: PersonaRegistry,
        store: Arc<dyn ObjectStore>,
        script_source: Arc<dyn ScriptSource>,
        dispatcher: Arc<dyn RenderDispatcher>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            config,
            registry,
            store,
            fetcher: Fetcher::new(FetchConfig::default()),
            catalog: builtin_catalog(),
            script_source,
            pexels: None,
            synthesizer: None,
            dispatcher,
            publisher,
        }
    }

    pub fn with_fetcher(mut self, fetcher: Fetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_catalog(mut self, catalog: Vec<SatisfyingSource>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_pexels(mut self, pexels: PexelsClient) -> Self {
        self.pexels = Some(pexels);
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Box<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Run the full pipeline for the named persona or group.
    ///
    /// Returns the output folder of the run.
    pub async fn run(&self, cast_name: &str) -> PipelineResult<String> {
        let seed: f64 = rand::random();
        self.run_seeded(cast_name, seed).await
    }

    /// Run with an explicit seed. The seed alone reproduces every random
    /// choice of the run for a fixed catalog.
    pub async fn run_seeded(&self, cast_name: &str, seed: f64) -> PipelineResult<String> {
        let cast = self.registry.resolve(cast_name)?;
        let carrying = carrying_persona(&cast)?;

        info!(cast = cast_name, seed, "Generating topic");
        let topic = self.script_source.generate_topic(&carrying).await?;

        info!(topic = %topic.topic, "Generating script");
        let sentences = self.script_source.generate_script(&cast, &topic).await?;
        if sentences.is_empty() {
            return Err(PipelineError::validation(
                "script generation produced no sentences",
            ));
        }

        let folder = unique_run_folder();
        info!(folder = %folder, sentences = sentences.len(), "Running generation stages");

        let group = cast.clone().into_group();
        let services = StageServices {
            store: self.store.as_ref(),
            fetcher: &self.fetcher,
            pexels: self.pexels.as_ref(),
            synthesizer: self.synthesizer.as_deref(),
            catalog: &self.catalog,
        };
        let outputs =
            run_generation_stages(&services, &self.config, &group, &sentences, &folder, seed)
                .await?;

        let sentences = merge_stage_outputs(sentences, outputs.illustrations, outputs.alignments);
        let output_config = compile_output_config(
            seed,
            cast,
            sentences,
            outputs.satisfying_video,
            topic,
            self.config.quality,
        )?;
        write_output_config(self.store.as_ref(), &folder, &output_config).await?;

        info!(folder = %folder, "Queuing render");
        let job = RenderVideoJob::new(&folder)
            .with_show_progress(self.config.show_progress)
            .with_fake_render(self.config.fake_render);

        if let Err(e) = self.dispatcher.dispatch_and_wait(job).await {
            if let PipelineError::RenderFailed(reason) = &e {
                error!(folder = %folder, reason = %reason, "Render job failed; stopping before publish");
            }
            return Err(e);
        }

        info!(folder = %folder, "Publishing");
        self.publisher
            .publish(
                &output_config.topic.video_metadata,
                &artifacts::render_key(&folder),
            )
            .await?;

        Ok(folder)
    }
}

/// The persona whose prompts drive topic generation.
fn carrying_persona(cast: &Cast) -> PipelineResult<PersonaConfig> {
    match cast {
        Cast::Persona(p) => Ok(p.clone()),
        Cast::Group(g) => g.members.first().cloned().ok_or_else(|| {
            PipelineError::validation("persona group has no members")
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_folders_are_unique_and_prefixed() {
        let a = unique_run_folder();
        let b = unique_run_folder();

        assert_ne!(a, b);
        assert!(a.starts_with("output/"));
        // "output/" + YYYYMMDD-HHMMSS + "-" + 8 hex chars
        assert_eq!(a.len(), "output/".len() + 15 + 1 + 8);
    }
}
