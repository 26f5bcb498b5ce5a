//! phosort - sort photos and videos into a year based hierarchy
//!
//! Every media file under a directory is moved (or copied) to
//! `<root>/<YYYY>/<original folders>/<file>`, where the year comes from:
//! - EXIF metadata for images
//! - Container metadata (FFprobe) for videos
//! - The file system status-change time as a fallback
//!
//! Names can optionally carry a `-YYYY-MM-DD` token and have their spaces
//! replaced. Existing files are never overwritten, and a dry run reports
//! everything without touching the disk.

pub mod cli;
pub mod config;
pub mod error;
pub mod plan;
pub mod process;
pub mod scan;
pub mod signal;
pub mod time;

pub use cli::Cli;
pub use config::{Config, ConfigError, FileOperation, MediaKind};
pub use error::{Error, Result};
pub use plan::plan_destination;
pub use process::{FileResult, Outcome, RunReport, SkipReason, Sorter};
pub use scan::{MediaFile, MediaPatterns, discover};
pub use time::{CreationDate, DateSource, EmbeddedMetadata, MetadataReader, resolve_date};
