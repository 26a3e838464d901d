//! Topic and script generation against a chat-model contract.
//!
//! The chat model is an external collaborator with a narrow contract; this
//! module owns prompt assembly from the persona templates and the single
//! parse attempt over the reply. Replies may arrive fenced in a code block
//! and may carry a reasoning block; both are stripped before parsing, and a
//! reply that still fails to parse is an upstream parse error — there is no
//! second attempt.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use shortgen_models::{artifacts, Cast, FullTopicContext, PersonaConfig, ScriptSentence};
use shortgen_storage::{get_json, ObjectStore};

use crate::error::{PipelineError, PipelineResult};

/// Narrow chat-model contract.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> PipelineResult<String>;
}

/// Source of topics and scripts, substitutable at the stage boundary.
#[async_trait]
pub trait ScriptSource: Send + Sync {
    /// Produce the topic context for this run.
    async fn generate_topic(&self, persona: &PersonaConfig) -> PipelineResult<FullTopicContext>;

    /// Produce the ordered sentence sequence for the cast and topic.
    async fn generate_script(
        &self,
        cast: &Cast,
        topic: &FullTopicContext,
    ) -> PipelineResult<Vec<ScriptSentence>>;
}

const SYSTEM_PROMPT: &str =
    "You write content for short vertical videos. Reply with JSON only, no commentary.";

/// Drop a Markdown code fence around the payload, if present.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") up to the end of the fence line.
    let rest = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => rest,
    };
    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Drop a `<reasoning>…</reasoning>` (or `<think>…</think>`) block.
fn strip_reasoning_block(raw: &str) -> String {
    let mut out = raw.to_string();
    for tag in ["reasoning", "think"] {
        let open = format!("<{tag}>");
        let close = format!("</{tag}>");
        if let (Some(start), Some(end)) = (out.find(&open), out.find(&close)) {
            if end > start {
                out.replace_range(start..end + close.len(), "");
            }
        }
    }
    out
}

/// One parse attempt over a script reply.
pub fn parse_script_response(raw: &str) -> PipelineResult<Vec<ScriptSentence>> {
    let cleaned = strip_reasoning_block(raw);
    let payload = strip_code_fence(&cleaned);
    serde_json::from_str(payload)
        .map_err(|e| PipelineError::upstream_parse(format!("script reply is not valid JSON: {e}")))
}

/// One parse attempt over a topic reply.
pub fn parse_topic_response(raw: &str) -> PipelineResult<FullTopicContext> {
    let cleaned = strip_reasoning_block(raw);
    let payload = strip_code_fence(&cleaned);
    serde_json::from_str(payload)
        .map_err(|e| PipelineError::upstream_parse(format!("topic reply is not valid JSON: {e}")))
}

/// OpenAI-compatible chat completion client.
pub struct HttpChatModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl HttpChatModel {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Create from `LLM_API_KEY` / `LLM_MODEL` / `LLM_BASE_URL`.
    pub fn from_env() -> PipelineResult<Self> {
        let api_key = std::env::var("LLM_API_KEY")
            .map_err(|_| PipelineError::network("LLM_API_KEY not set"))?;
        let model =
            std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let mut chat = Self::new(api_key, model);
        if let Ok(base_url) = std::env::var("LLM_BASE_URL") {
            chat.base_url = base_url;
        }
        Ok(chat)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ChatModel for HttpChatModel {
    async fn complete(&self, system: &str, user: &str) -> PipelineResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::network(e.to_string()))?
            .error_for_status()
            .map_err(|e| PipelineError::network(e.to_string()))?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::network(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| PipelineError::upstream_parse("chat reply carried no content"))
    }
}

/// Script source backed by a chat model.
pub struct LlmScriptSource {
    model: Box<dyn ChatModel>,
}

impl LlmScriptSource {
    pub fn new(model: Box<dyn ChatModel>) -> Self {
        Self { model }
    }

    fn script_prompt(cast: &Cast, topic: &FullTopicContext) -> String {
        match cast {
            Cast::Persona(persona) => persona.script_guidelines(&topic.topic),
            Cast::Group(group) => {
                let mut prompt = format!(
                    "{}\n\nThe topic is: {}\n\nSpeakers:\n",
                    group.conversation_prompt, topic.topic
                );
                for member in &group.members {
                    prompt.push_str(&format!("- {}: {}\n", member.id, member.personality));
                }
                prompt.push_str(
                    "\nEvery sentence object must carry a personaId naming its speaker.",
                );
                prompt
            }
        }
    }
}

#[async_trait]
impl ScriptSource for LlmScriptSource {
    async fn generate_topic(&self, persona: &PersonaConfig) -> PipelineResult<FullTopicContext> {
        debug!(persona = %persona.id, "generating topic");
        let reply = self
            .model
            .complete(SYSTEM_PROMPT, &persona.random_topic_prompt())
            .await?;
        parse_topic_response(&reply)
    }

    async fn generate_script(
        &self,
        cast: &Cast,
        topic: &FullTopicContext,
    ) -> PipelineResult<Vec<ScriptSentence>> {
        let prompt = Self::script_prompt(cast, topic);
        let reply = self.model.complete(SYSTEM_PROMPT, &prompt).await?;
        parse_script_response(&reply)
    }
}

/// Script source reading pre-seeded fixtures from the store. Offline mode.
pub struct FixtureScriptSource {
    store: Arc<dyn ObjectStore>,
}

impl FixtureScriptSource {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ScriptSource for FixtureScriptSource {
    async fn generate_topic(&self, _persona: &PersonaConfig) -> PipelineResult<FullTopicContext> {
        Ok(get_json(self.store.as_ref(), &artifacts::fixtures::topic_key()).await?)
    }

    async fn generate_script(
        &self,
        _cast: &Cast,
        _topic: &FullTopicContext,
    ) -> PipelineResult<Vec<ScriptSentence>> {
        Ok(get_json(self.store.as_ref(), &artifacts::fixtures::script_key()).await?)
    }
}
