//! Pipeline orchestration and render job dispatch.
//!
//! This crate provides:
//! - Persona/group resolution at the pipeline entry point
//! - Topic/script generation against a chat-model contract
//! - The concurrent stage coordinator (illustrations, satisfying video, speech)
//! - The output-config compiler and validator
//! - Render job dispatch and the completion wait
//! - The publish hook invoked only after a successful render

pub mod compile;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod publish;
pub mod run;
pub mod script;
pub mod stages;
pub mod tts;

pub use compile::{compile_output_config, write_output_config};
pub use config::{PipelineConfig, RunMode, StageConcurrency, TtsProvider};
pub use dispatch::{QueueDispatcher, RenderDispatcher};
pub use error::{PipelineError, PipelineResult};
pub use publish::{LogPublisher, Publisher};
pub use run::{unique_run_folder, Pipeline};
pub use script::{
    parse_script_response, parse_topic_response, ChatModel, FixtureScriptSource,
    HttpChatModel, LlmScriptSource, ScriptSource,
};
pub use stages::{merge_stage_outputs, run_generation_stages, StageOutputs, StageServices};
pub use tts::{
    words_from_char_alignment, words_from_srt, CharacterAlignment, ElevenLabsSynthesizer,
    KokoroSynthesizer, Speech, SpeechSynthesizer,
};
