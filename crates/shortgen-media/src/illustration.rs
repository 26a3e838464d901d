//! Illustration search against the Pexels video API.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::debug;

use shortgen_models::IllustrationVideo;

use crate::error::{MediaError, MediaResult};

/// Resolution floor for portrait illustration clips.
pub const MIN_ILLUSTRATION_WIDTH: u32 = 540;
pub const MIN_ILLUSTRATION_HEIGHT: u32 = 960;

const DEFAULT_BASE_URL: &str = "https://api.pexels.com";
const DEFAULT_PER_PAGE: u32 = 10;

/// One video as returned by the search API, with its candidate files.
#[derive(Debug, Clone, Deserialize)]
pub struct PexelsVideo {
    pub id: u64,
    #[serde(default)]
    pub video_files: Vec<PexelsVideoFile>,
}

/// Wire shape of one candidate file (the API speaks snake_case).
#[derive(Debug, Clone, Deserialize)]
pub struct PexelsVideoFile {
    pub id: u64,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub link: String,
    pub fps: Option<f64>,
}

impl PexelsVideoFile {
    fn into_domain(self) -> IllustrationVideo {
        IllustrationVideo {
            id: self.id,
            quality: self.quality.unwrap_or_else(|| "sd".to_string()),
            file_type: self.file_type.unwrap_or_else(|| "video/mp4".to_string()),
            width: self.width,
            height: self.height,
            link: self.link,
            fps: self.fps,
        }
    }

    fn meets_floor(&self) -> bool {
        self.width.unwrap_or(0) >= MIN_ILLUSTRATION_WIDTH
            && self.height.unwrap_or(0) >= MIN_ILLUSTRATION_HEIGHT
    }

    fn pixel_area(&self) -> u64 {
        u64::from(self.width.unwrap_or(0)) * u64::from(self.height.unwrap_or(0))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

/// Pexels video search client.
#[derive(Debug, Clone)]
pub struct PexelsClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl PexelsClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from the `PEXELS_API_KEY` environment variable.
    pub fn from_env() -> MediaResult<Self> {
        let api_key = std::env::var("PEXELS_API_KEY")
            .map_err(|_| MediaError::search_failed("PEXELS_API_KEY not set"))?;
        Ok(Self::new(api_key))
    }

    /// Point the client at a different API host (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Search portrait videos for `term`.
    pub async fn search(&self, term: &str) -> MediaResult<Vec<PexelsVideo>> {
        debug!(term, "searching illustration videos");

        let response = self
            .client
            .get(format!("{}/videos/search", self.base_url))
            .header("Authorization", &self.api_key)
            .query(&[
                ("query", term),
                ("orientation", "portrait"),
                ("per_page", &DEFAULT_PER_PAGE.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: SearchResponse = response.json().await?;
        Ok(body.videos)
    }
}

/// Pick an illustration from search results.
///
/// Skips videos whose id was already used earlier in the run, then picks the
/// smallest file meeting the resolution floor, falling back to the first file
/// when none does. Returns the parent video id alongside the chosen file so
/// the caller can record it as used.
pub fn select_video(
    videos: &[PexelsVideo],
    used_ids: &HashSet<u64>,
) -> Option<(u64, IllustrationVideo)> {
    let video = videos
        .iter()
        .find(|v| !used_ids.contains(&v.id) && !v.video_files.is_empty())?;

    let chosen = video
        .video_files
        .iter()
        .filter(|f| f.meets_floor())
        .min_by_key(|f| f.pixel_area())
        .or_else(|| video.video_files.first())?;

    Some((video.id, chosen.clone().into_domain()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(id: u64, width: u32, height: u32) -> PexelsVideoFile {
        PexelsVideoFile {
            id,
            quality: Some("hd".to_string()),
            file_type: Some("video/mp4".to_string()),
            width: Some(width),
            height: Some(height),
            link: format!("https://example.com/file_{id}.mp4"),
            fps: Some(30.0),
        }
    }

    fn video(id: u64, files: Vec<PexelsVideoFile>) -> PexelsVideo {
        PexelsVideo {
            id,
            video_files: files,
        }
    }

    #[test]
    fn picks_smallest_file_meeting_floor() {
        let videos = vec![video(
            1,
            vec![
                file(10, 2160, 3840),
                file(11, 540, 960),
                file(12, 1080, 1920),
                file(13, 360, 640), // below floor
            ],
        )];

        let (video_id, chosen) = select_video(&videos, &HashSet::new()).unwrap();
        assert_eq!(video_id, 1);
        assert_eq!(chosen.id, 11);
    }

    #[test]
    fn falls_back_to_first_file_when_none_meets_floor() {
        let videos = vec![video(1, vec![file(10, 360, 640), file(11, 426, 240)])];

        let (_, chosen) = select_video(&videos, &HashSet::new()).unwrap();
        assert_eq!(chosen.id, 10);
    }

    #[test]
    fn skips_already_used_video_ids() {
        let videos = vec![
            video(1, vec![file(10, 1080, 1920)]),
            video(2, vec![file(20, 1080, 1920)]),
        ];
        let used: HashSet<u64> = [1].into_iter().collect();

        let (video_id, chosen) = select_video(&videos, &used).unwrap();
        assert_eq!(video_id, 2);
        assert_eq!(chosen.id, 20);
    }

    #[test]
    fn no_unused_candidates_yields_none() {
        let videos = vec![video(1, vec![file(10, 1080, 1920)])];
        let used: HashSet<u64> = [1].into_iter().collect();

        assert!(select_video(&videos, &used).is_none());
        assert!(select_video(&[], &HashSet::new()).is_none());
    }

    #[test]
    fn search_response_parses_api_shape() {
        let body = r#"{
            "page": 1,
            "videos": [{
                "id": 857251,
                "width": 1080,
                "height": 1920,
                "video_files": [{
                    "id": 1620,
                    "quality": "hd",
                    "file_type": "video/mp4",
                    "width": 1080,
                    "height": 1920,
                    "fps": 29.97,
                    "link": "https://player.vimeo.com/external/x.mp4"
                }]
            }]
        }"#;

        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.videos.len(), 1);
        assert_eq!(parsed.videos[0].video_files[0].id, 1620);
    }
}
