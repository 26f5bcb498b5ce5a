//! Sort configuration
//!
//! A [`Config`] is built once at startup, from CLI flags layered over an
//! optional TOML file, and is passed by reference to every stage of a run.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// What happens to a source file once its destination is known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileOperation {
    /// Move files to the destination (rename, or copy then delete)
    #[default]
    Move,
    /// Copy files to the destination, leaving the source in place
    Copy,
}

/// Media classification of a discovered file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Configuration for a sort run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory being sorted; destinations are created beneath it
    pub root: PathBuf,

    /// Insert a `-YYYY-MM-DD` token before the file extension
    pub rename_files: bool,

    /// Replace spaces in file names with `-`
    pub replace_file_spaces: bool,

    /// Replace spaces in directory names with `-`
    pub replace_directory_spaces: bool,

    /// Only sort images, ignore videos
    pub image_only: bool,

    /// File operation mode
    pub operation: FileOperation,

    /// Dry run mode - report what would happen without touching the filesystem
    pub dry_run: bool,

    /// Verbose output
    pub verbose: bool,

    /// Recognized image extensions (matched case-insensitively)
    pub image_extensions: Vec<String>,

    /// Recognized video extensions (matched case-insensitively)
    pub video_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            rename_files: false,
            replace_file_spaces: false,
            replace_directory_spaces: false,
            image_only: false,
            operation: FileOperation::default(),
            dry_run: false,
            verbose: false,
            image_extensions: vec!["jpg".into(), "jpeg".into()],
            video_extensions: vec!["avi".into(), "mov".into()],
        }
    }
}

impl Config {
    /// Whether files are copied rather than moved
    pub fn is_copy(&self) -> bool {
        self.operation == FileOperation::Copy
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError { source: e })?;

        fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Errors that can occur when loading or saving configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to write configuration file
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to serialize configuration
    SerializeError { source: toml::ser::Error },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            ConfigError::ParseError { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), source)
            }
            ConfigError::WriteError { path, source } => {
                write!(f, "Failed to write config file '{}': {}", path.display(), source)
            }
            ConfigError::SerializeError { source } => {
                write!(f, "Failed to serialize config: {}", source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::WriteError { source, .. } => Some(source),
            ConfigError::SerializeError { source } => Some(source),
        }
    }
}
