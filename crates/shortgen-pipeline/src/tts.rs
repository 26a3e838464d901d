//! Speech synthesis contract and backends.
//!
//! Two interchangeable backends sit behind [`SpeechSynthesizer`]: an
//! ElevenLabs-style API returning base64 audio with character-level
//! alignment, and a Kokoro-style service returning audio plus an SRT file.
//! Both are reduced to the same `Speech` shape with word-level timings.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use tracing::debug;

use shortgen_models::{PersonaConfig, WordTiming};

use crate::error::{PipelineError, PipelineResult};

/// Synthesized speech for one sentence.
#[derive(Debug, Clone)]
pub struct Speech {
    pub audio: Vec<u8>,
    pub alignment: Vec<WordTiming>,
}

/// Narrow synthesis contract both backends implement.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, persona: &PersonaConfig) -> PipelineResult<Speech>;
}

/// Character-level alignment as returned by the ElevenLabs API.
#[derive(Debug, Clone, Deserialize)]
pub struct CharacterAlignment {
    pub characters: Vec<String>,
    pub character_start_times_seconds: Vec<f64>,
    pub character_end_times_seconds: Vec<f64>,
}

/// Group character timings into word timings at whitespace boundaries.
pub fn words_from_char_alignment(alignment: &CharacterAlignment) -> Vec<WordTiming> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut start: Option<f64> = None;
    let mut last_end = 0.0;

    for (i, ch) in alignment.characters.iter().enumerate() {
        let char_start = alignment
            .character_start_times_seconds
            .get(i)
            .copied()
            .unwrap_or(last_end);
        let char_end = alignment
            .character_end_times_seconds
            .get(i)
            .copied()
            .unwrap_or(char_start);

        if start.is_none() {
            start = Some(char_start);
        }

        if ch == " " {
            if !current.is_empty() {
                words.push(WordTiming {
                    text: std::mem::take(&mut current),
                    start: start.unwrap_or(char_start),
                    end: last_end,
                });
            }
            start = None;
        } else {
            current.push_str(ch);
            last_end = char_end;
        }
    }

    // Catch the last word if the text doesn't end in a space.
    if !current.is_empty() {
        words.push(WordTiming {
            text: current,
            start: start.unwrap_or(0.0),
            end: last_end,
        });
    }

    words
}

/// Parse SRT subtitle cues (one word per cue) into word timings.
pub fn words_from_srt(srt: &str) -> Vec<WordTiming> {
    let mut words = Vec::new();
    let mut lines = srt.lines().peekable();

    while let Some(line) = lines.next() {
        let Some((start_raw, end_raw)) = line.split_once("-->") else {
            continue;
        };
        let (Some(start), Some(end)) = (
            srt_time_to_seconds(start_raw.trim()),
            srt_time_to_seconds(end_raw.trim()),
        ) else {
            continue;
        };

        let mut text = String::new();
        while let Some(next) = lines.peek() {
            let trimmed = next.trim();
            if trimmed.is_empty() {
                break;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(trimmed);
            lines.next();
        }

        if !text.is_empty() {
            words.push(WordTiming { text, start, end });
        }
    }

    words
}

/// Parse an `HH:MM:SS,mmm` SRT time to seconds.
fn srt_time_to_seconds(raw: &str) -> Option<f64> {
    let (hms, millis) = raw.split_once(',').unwrap_or((raw, "0"));
    let mut parts = hms.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let millis: f64 = millis.parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds + millis / 1000.0)
}

/// ElevenLabs-style synthesis backend.
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Deserialize)]
struct ElevenLabsReply {
    audio_base64: String,
    alignment: Option<CharacterAlignment>,
}

impl ElevenLabsSynthesizer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.elevenlabs.io".to_string(),
        }
    }

    /// Create from the `ELEVENLABS_API_KEY` environment variable.
    pub fn from_env() -> PipelineResult<Self> {
        let api_key = std::env::var("ELEVENLABS_API_KEY")
            .map_err(|_| PipelineError::network("ELEVENLABS_API_KEY not set"))?;
        Ok(Self::new(api_key))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str, persona: &PersonaConfig) -> PipelineResult<Speech> {
        debug!(voice = %persona.eleven_labs_voice_id, "synthesizing with ElevenLabs");

        let url = format!(
            "{}/v1/text-to-speech/{}/with-timestamps",
            self.base_url, persona.eleven_labs_voice_id
        );
        let body = serde_json::json!({
            "text": text,
            "model_id": "eleven_multilingual_v2",
            "output_format": "opus_48000_96",
            "voice_settings": {
                "speed": 0.95,
                "stability": 0.33,
                "similarity_boost": 0.8,
                "style": 0.5,
            },
        });

        let reply: ElevenLabsReply = self
            .client
            .post(url)
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::network(e.to_string()))?
            .error_for_status()
            .map_err(|e| PipelineError::network(e.to_string()))?
            .json()
            .await
            .map_err(|e| PipelineError::network(e.to_string()))?;

        let alignment = reply
            .alignment
            .ok_or_else(|| PipelineError::synthesis("reply carried no alignment"))?;

        let audio = base64::engine::general_purpose::STANDARD
            .decode(reply.audio_base64)
            .map_err(|e| PipelineError::synthesis(format!("audio payload is not base64: {e}")))?;

        Ok(Speech {
            audio,
            alignment: words_from_char_alignment(&alignment),
        })
    }
}

/// Kokoro-style synthesis backend (audio plus an SRT subtitle file).
pub struct KokoroSynthesizer {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct KokoroReply {
    audio_url: String,
    srt_url: String,
}

impl KokoroSynthesizer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Create from the `KOKORO_BASE_URL` environment variable.
    pub fn from_env() -> PipelineResult<Self> {
        let base_url = std::env::var("KOKORO_BASE_URL")
            .map_err(|_| PipelineError::network("KOKORO_BASE_URL not set"))?;
        Ok(Self::new(base_url))
    }
}

#[async_trait]
impl SpeechSynthesizer for KokoroSynthesizer {
    async fn synthesize(&self, text: &str, persona: &PersonaConfig) -> PipelineResult<Speech> {
        debug!(voice = %persona.kokoro_voice_id, "synthesizing with Kokoro");

        let body = serde_json::json!({
            "text": text,
            "voice": persona.kokoro_voice_id,
            "language": persona.language,
            "speed": 0.9,
        });

        let reply: KokoroReply = self
            .client
            .post(format!("{}/api/tts", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::network(e.to_string()))?
            .error_for_status()
            .map_err(|e| PipelineError::network(e.to_string()))?
            .json()
            .await
            .map_err(|e| PipelineError::network(e.to_string()))?;

        let audio = self
            .client
            .get(&reply.audio_url)
            .send()
            .await
            .map_err(|e| PipelineError::network(e.to_string()))?
            .error_for_status()
            .map_err(|e| PipelineError::network(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| PipelineError::network(e.to_string()))?
            .to_vec();

        let srt = self
            .client
            .get(&reply.srt_url)
            .send()
            .await
            .map_err(|e| PipelineError::network(e.to_string()))?
            .error_for_status()
            .map_err(|e| PipelineError::network(e.to_string()))?
            .text()
            .await
            .map_err(|e| PipelineError::network(e.to_string()))?;

        let alignment = words_from_srt(&srt);
        if alignment.is_empty() {
            return Err(PipelineError::synthesis("SRT reply carried no cues"));
        }

        Ok(Speech { audio, alignment })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<String> {
        s.chars().map(|c| c.to_string()).collect()
    }

    #[test]
    fn char_alignment_groups_words_at_spaces() {
        // "Hi yo": H(0.0-0.1) i(0.1-0.2) space(0.2-0.3) y(0.3-0.4) o(0.4-0.5)
        let alignment = CharacterAlignment {
            characters: chars("Hi yo"),
            character_start_times_seconds: vec![0.0, 0.1, 0.2, 0.3, 0.4],
            character_end_times_seconds: vec![0.1, 0.2, 0.3, 0.4, 0.5],
        };

        let words = words_from_char_alignment(&alignment);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "Hi");
        assert_eq!(words[0].start, 0.0);
        assert_eq!(words[0].end, 0.2);
        assert_eq!(words[1].text, "yo");
        assert_eq!(words[1].end, 0.5);
    }

    #[test]
    fn char_alignment_catches_trailing_word() {
        let alignment = CharacterAlignment {
            characters: chars("ok"),
            character_start_times_seconds: vec![0.0, 0.2],
            character_end_times_seconds: vec![0.2, 0.4],
        };

        let words = words_from_char_alignment(&alignment);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "ok");
        assert_eq!(words[0].end, 0.4);
    }

    #[test]
    fn srt_cues_parse_to_word_timings() {
        let srt = "1\n00:00:00,000 --> 00:00:00,350\nHello\n\n2\n00:00:00,350 --> 00:00:00,900\nthere\n";

        let words = words_from_srt(srt);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "Hello");
        assert!((words[0].start - 0.0).abs() < 1e-9);
        assert!((words[0].end - 0.35).abs() < 1e-9);
        assert_eq!(words[1].text, "there");
        assert!((words[1].end - 0.9).abs() < 1e-9);
    }

    #[test]
    fn srt_with_hours_and_garbage_lines() {
        let srt = "WEBVTT-ish noise\n\n7\n01:02:03,500 --> 01:02:04,000\nword\n";
        let words = words_from_srt(srt);
        assert_eq!(words.len(), 1);
        assert!((words[0].start - 3723.5).abs() < 1e-9);
    }

    #[test]
    fn empty_srt_yields_no_words() {
        assert!(words_from_srt("").is_empty());
        assert!(words_from_srt("1\n\n2\n").is_empty());
    }
}
