//! Error types for phosort

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for phosort operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for phosort
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read EXIF data from {path}: {message}")]
    ExifRead { path: PathBuf, message: String },

    #[error("Failed to parse timestamp from {source_info}: {message}")]
    TimestampParse { source_info: String, message: String },

    #[error("Failed to extract video metadata from {path}: {message}")]
    VideoMetadata { path: PathBuf, message: String },

    #[error("FFprobe not found. Please install FFmpeg and ensure ffprobe is in PATH")]
    FfprobeNotFound,

    #[error("Source file no longer exists: {path}")]
    SourceMissing { path: PathBuf },

    #[error("Provided directory does not exist: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Provided argument is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}
