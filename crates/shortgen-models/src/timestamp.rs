//! Timestamp formatting for downstream tooling.
//!
//! Clip windows are exchanged with the render worker and yt-dlp in a fixed
//! `HH:MM:SS` textual form.

use thiserror::Error;

/// Format whole seconds into the fixed `HH:MM:SS` form.
///
/// # Examples
/// ```
/// use shortgen_models::timestamp::format_hms;
/// assert_eq!(format_hms(0), "00:00:00");
/// assert_eq!(format_hms(1777), "00:29:37");
/// assert_eq!(format_hms(3661), "01:01:01");
/// ```
pub fn format_hms(total_secs: u32) -> String {
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

/// Parse an `HH:MM:SS` string back to whole seconds.
pub fn parse_hms(ts: &str) -> Result<u32, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = ts.split(':').collect();
    if parts.len() != 3 {
        return Err(TimestampError::InvalidFormat(ts.to_string()));
    }

    let hours: u32 = parts[0]
        .parse()
        .map_err(|_| TimestampError::InvalidValue("hours", parts[0].to_string()))?;
    let minutes: u32 = parts[1]
        .parse()
        .map_err(|_| TimestampError::InvalidValue("minutes", parts[1].to_string()))?;
    let seconds: u32 = parts[2]
        .parse()
        .map_err(|_| TimestampError::InvalidValue("seconds", parts[2].to_string()))?;

    if minutes >= 60 || seconds >= 60 {
        return Err(TimestampError::InvalidFormat(ts.to_string()));
    }

    Ok(hours * 3600 + minutes * 60 + seconds)
}

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("Timestamp cannot be empty")]
    Empty,

    #[error("Invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    #[error("Invalid timestamp format '{0}'. Expected HH:MM:SS")]
    InvalidFormat(String),
}
