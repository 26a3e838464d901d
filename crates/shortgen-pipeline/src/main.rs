//! Pipeline orchestrator binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shortgen_media::PexelsClient;
use shortgen_models::PersonaRegistry;
use shortgen_pipeline::{
    ElevenLabsSynthesizer, FixtureScriptSource, HttpChatModel, KokoroSynthesizer, LlmScriptSource,
    LogPublisher, Pipeline, PipelineConfig, QueueDispatcher, RunMode, ScriptSource,
    SpeechSynthesizer, TtsProvider,
};
use shortgen_storage::{LocalStore, ObjectStore, S3Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("shortgen=info".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }

    let config = PipelineConfig::from_env();
    info!("Pipeline config: {:?}", config);

    let cast_name = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "maxwell".to_string());

    let store: Arc<dyn ObjectStore> = match config.mode {
        RunMode::Online => Arc::new(S3Store::from_env()?),
        RunMode::Offline => {
            let root =
                std::env::var("SHORTGEN_DATA_DIR").unwrap_or_else(|_| "./data".to_string());
            Arc::new(LocalStore::new(root))
        }
    };

    let script_source: Arc<dyn ScriptSource> = match config.mode {
        RunMode::Online => Arc::new(LlmScriptSource::new(Box::new(HttpChatModel::from_env()?))),
        RunMode::Offline => Arc::new(FixtureScriptSource::new(store.clone())),
    };

    let dispatcher = Arc::new(QueueDispatcher::from_env()?);

    let mut pipeline = Pipeline::new(
        config.clone(),
        PersonaRegistry::builtin(),
        store,
        script_source,
        dispatcher,
        Arc::new(LogPublisher),
    );

    if config.mode == RunMode::Online {
        pipeline = pipeline.with_pexels(PexelsClient::from_env()?);

        let synthesizer: Box<dyn SpeechSynthesizer> = match config.tts_provider {
            TtsProvider::ElevenLabs => Box::new(ElevenLabsSynthesizer::from_env()?),
            TtsProvider::Kokoro => Box::new(KokoroSynthesizer::from_env()?),
        };
        pipeline = pipeline.with_synthesizer(synthesizer);
    }

    match pipeline.run(&cast_name).await {
        Ok(folder) => {
            info!(folder = %folder, "Pipeline run complete");
            Ok(())
        }
        Err(e) => {
            error!("Pipeline run failed: {}", e);
            std::process::exit(1);
        }
    }
}
