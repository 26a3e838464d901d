//! Topic context produced once per pipeline run.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A recent news item feeding topic selection.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
}

/// Metadata for the hosted video (title, description, hashtags).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

/// Everything the pipeline knows about the topic of one video.
///
/// Produced once per run, read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FullTopicContext {
    /// Topic label the script is written about
    pub topic: String,
    /// Recent news items the topic was derived from (may be empty)
    #[serde(default)]
    pub latest_news: Vec<NewsItem>,
    /// Metadata for the eventual upload
    pub video_metadata: VideoMetadata,
}

impl FullTopicContext {
    /// A bare topic with no news backing, used for fixed-topic runs.
    pub fn bare(topic: impl Into<String>, title: impl Into<String>) -> Self {
        let topic = topic.into();
        Self {
            topic: topic.clone(),
            latest_news: Vec::new(),
            video_metadata: VideoMetadata {
                title: title.into(),
                description: topic,
                hashtags: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_serde_uses_camel_case() {
        let topic = FullTopicContext::bare("test topic", "Test!");
        let json = serde_json::to_string(&topic).expect("serialize topic");
        assert!(json.contains("\"latestNews\""));
        assert!(json.contains("\"videoMetadata\""));
    }
}
