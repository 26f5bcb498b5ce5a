//! Recursive discovery of media files under the sort root

use crate::config::{Config, MediaKind};
use crate::error::Result;
use regex::{Regex, RegexBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A file eligible for sorting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// Path as discovered under the root
    pub path: PathBuf,
    /// Same path, relative to the root
    pub relative_path: PathBuf,
    /// Image or video, from the file extension
    pub kind: MediaKind,
}

impl MediaFile {
    /// Build a media file from a path under `root`
    pub fn new(root: &Path, path: PathBuf, kind: MediaKind) -> Self {
        let relative_path = path
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.clone());
        Self {
            path,
            relative_path,
            kind,
        }
    }
}

/// Case-insensitive filename patterns for images and videos
#[derive(Debug, Clone)]
pub struct MediaPatterns {
    image: Option<Regex>,
    video: Option<Regex>,
}

impl MediaPatterns {
    /// Build the patterns from the configured extension lists
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            image: extension_pattern(&config.image_extensions)?,
            video: extension_pattern(&config.video_extensions)?,
        })
    }

    /// Classify a file name, honouring `image_only`
    pub fn classify(&self, name: &str, image_only: bool) -> Option<MediaKind> {
        let matches = |pattern: &Option<Regex>| pattern.as_ref().is_some_and(|p| p.is_match(name));

        if matches(&self.image) {
            Some(MediaKind::Image)
        } else if !image_only && matches(&self.video) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

/// `^.+\.(ext1|ext2)$`, case-insensitive; `None` for an empty list
fn extension_pattern(extensions: &[String]) -> Result<Option<Regex>> {
    let alternatives: Vec<String> = extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.'))
        .filter(|e| !e.is_empty())
        .map(regex::escape)
        .collect();

    if alternatives.is_empty() {
        return Ok(None);
    }

    let pattern = format!(r"^.+\.({})$", alternatives.join("|"));
    Ok(Some(
        RegexBuilder::new(&pattern).case_insensitive(true).build()?,
    ))
}

/// Walk `root` recursively and collect every matching media file
///
/// Symbolic links are not followed. Entries that cannot be read are logged
/// and skipped, so one unreadable subtree never aborts the walk.
pub fn discover(root: &Path, patterns: &MediaPatterns, image_only: bool) -> Vec<MediaFile> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = ?e.path(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            debug!(path = ?entry.path(), "Skipping non UTF-8 file name");
            continue;
        };

        if let Some(kind) = patterns.classify(name, image_only) {
            files.push(MediaFile::new(root, entry.into_path(), kind));
        }
    }

    debug!(count = files.len(), ?root, "Discovery complete");
    files
}
