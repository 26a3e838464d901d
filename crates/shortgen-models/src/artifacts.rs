//! Artifact key layout for one pipeline run.
//!
//! The output folder name is the single addressing key for everything a run
//! produces; all artifact keys are built from it. Sentence indices are
//! 1-based to match the sentence numbering in logs and fixtures.

/// The compiled output document.
pub fn config_key(folder: &str) -> String {
    format!("{folder}/config.json")
}

/// Illustration clip for sentence `n` (1-based).
pub fn illustration_key(folder: &str, n: usize) -> String {
    format!("{folder}/sentence_{n}_illustration.mp4")
}

/// Synthesized audio for sentence `n` (1-based).
pub fn sentence_audio_key(folder: &str, n: usize) -> String {
    format!("{folder}/sentence_{n}.ogg")
}

/// The background satisfying-video clip.
pub fn satisfying_key(folder: &str) -> String {
    format!("{folder}/satisfying.webm")
}

/// The rendered video, produced by the external render worker.
pub fn render_key(folder: &str) -> String {
    format!("{folder}/render.mp4")
}

/// Pre-seeded fixtures read by the offline mode.
pub mod fixtures {
    /// Prefix every fixture key lives under.
    pub const PREFIX: &str = "assets/debug";

    pub fn script_key() -> String {
        format!("{PREFIX}/script.json")
    }

    pub fn topic_key() -> String {
        format!("{PREFIX}/topic.json")
    }

    pub fn sentence_audio_key(n: usize) -> String {
        format!("{PREFIX}/sentence_{n}.ogg")
    }

    pub fn sentence_subs_key(n: usize) -> String {
        format!("{PREFIX}/sentence_{n}_subs.json")
    }

    pub fn illustration_key(n: usize) -> String {
        format!("{PREFIX}/sentence_{n}_illustration.mp4")
    }

    pub fn satisfying_key() -> String {
        format!("{PREFIX}/satisfying.webm")
    }
}
