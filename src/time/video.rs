//! Video metadata extraction via FFprobe

use crate::error::{Error, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use serde_json::Value;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;
use tracing::{debug, trace};

/// Metadata keys to try for creation date
const CREATION_DATE_KEYS: &[&str] = &[
    "creation_time",
    "com.apple.quicktime.creationdate",
    "date",
    "date_recorded",
];

/// Cached FFprobe availability check
static FFPROBE_AVAILABLE: OnceLock<bool> = OnceLock::new();

fn is_ffprobe_available() -> bool {
    *FFPROBE_AVAILABLE.get_or_init(|| Command::new("ffprobe").arg("-version").output().is_ok())
}

/// Extract creation time from video container metadata using FFprobe
///
/// Container timestamps carrying a zone (`Z` or `+hh:mm`) are converted to
/// local time so the calendar date matches the one an image would get.
pub fn extract_video_time(path: &Path) -> Result<NaiveDateTime> {
    if !is_ffprobe_available() {
        return Err(Error::FfprobeNotFound);
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|e| Error::VideoMetadata {
            path: path.to_path_buf(),
            message: format!("Failed to execute ffprobe: {}", e),
        })?;

    if !output.status.success() {
        return Err(Error::VideoMetadata {
            path: path.to_path_buf(),
            message: format!(
                "FFprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ),
        });
    }

    let json: Value = serde_json::from_slice(&output.stdout)?;
    trace!(?path, %json, "FFprobe output");

    find_creation_time(&json).ok_or_else(|| Error::VideoMetadata {
        path: path.to_path_buf(),
        message: "No creation time found in video metadata".to_string(),
    })
}

/// Search format tags first, then every stream's tags
fn find_creation_time(json: &Value) -> Option<NaiveDateTime> {
    let format_tags = json.get("format").and_then(|f| f.get("tags"));
    let stream_tags = json
        .get("streams")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|s| s.get("tags"));

    format_tags.into_iter().chain(stream_tags).find_map(|tags| {
        CREATION_DATE_KEYS.iter().find_map(|key| {
            [key.to_string(), key.to_uppercase()]
                .iter()
                .filter_map(|k| tags.get(k).and_then(Value::as_str))
                .find_map(|value| {
                    let parsed = parse_video_datetime(value);
                    if parsed.is_some() {
                        debug!(key, value, "Found video creation time");
                    }
                    parsed
                })
        })
    })
}

/// Parse a container timestamp into local time
///
/// Values without a zone are taken as already local.
pub fn parse_video_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    // Unset QuickTime dates count from 1904 and mean "unknown"
    if s.starts_with("1904-01-01") || s.starts_with("1970-01-01") {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    const ZONED_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%z"];
    if let Some(dt) = ZONED_FORMATS
        .iter()
        .find_map(|f| DateTime::parse_from_str(s, f).ok())
    {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y:%m:%d %H:%M:%S",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
}
