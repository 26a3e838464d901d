//! Satisfying-video clip acquisition using yt-dlp.
//!
//! Only the selected window is downloaded (`--download-sections`), not the
//! whole multi-hour loop. The clip lands in the store under
//! `{folder}/satisfying.webm`.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use shortgen_models::artifacts;
use shortgen_storage::ObjectStore;

use crate::catalog::SatisfyingSegment;
use crate::error::{MediaError, MediaResult};
use crate::fetch::{with_retries, FetchConfig};

/// Download the segment's window and store it for the run.
///
/// Returns the storage key of the stored clip. Each yt-dlp invocation counts
/// as one attempt against `fetch_config`'s retry budget; the clip is read
/// back from a scratch directory and stored with a single `put`.
pub async fn download_satisfying_segment(
    store: &dyn ObjectStore,
    folder: &str,
    segment: &SatisfyingSegment,
    fetch_config: &FetchConfig,
) -> MediaResult<String> {
    which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)?;

    let scratch = tempfile::tempdir()?;
    let clip_path = scratch.path().join("satisfying.webm");

    info!(
        source_id = %segment.source_id,
        start = %segment.start_hms(),
        end = %segment.end_hms(),
        "downloading satisfying-video segment"
    );

    let section = segment.section_arg();
    let bytes = with_retries(fetch_config, "satisfying segment download", || {
        run_ytdlp_section(&segment.url, &section, &clip_path)
    })
    .await?;

    let key = artifacts::satisfying_key(folder);
    store.put(&key, bytes, "video/webm").await?;
    Ok(key)
}

async fn run_ytdlp_section(
    url: &str,
    section_arg: &str,
    clip_path: &Path,
) -> MediaResult<Vec<u8>> {
    // Stale output from a failed previous attempt must not be read back.
    if clip_path.exists() {
        tokio::fs::remove_file(clip_path).await?;
    }

    let output_path = clip_path.to_string_lossy();
    let output = Command::new("yt-dlp")
        .args([
            "--download-sections",
            section_arg,
            "-f",
            "bestvideo[ext=webm]/bestvideo[ext=mp4]/best",
            "-o",
            &output_path,
            url,
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("yt-dlp stderr: {}", stderr);
        return Err(MediaError::download_failed(format!(
            "yt-dlp failed: {}",
            stderr.lines().last().unwrap_or("Unknown error")
        )));
    }

    if !clip_path.exists() {
        return Err(MediaError::download_failed("Output file not created"));
    }

    Ok(tokio::fs::read(clip_path).await?)
}
