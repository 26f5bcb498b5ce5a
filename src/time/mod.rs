//! Creation date resolution
//!
//! A file's creation date comes from:
//! - EXIF metadata for images
//! - Container metadata (via FFprobe) for videos
//! - The file system status-change time when neither is available

pub mod exif;
pub mod video;

use crate::config::MediaKind;
use crate::error::{Error, Result};
use crate::scan::MediaFile;
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Source of the resolved date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    /// Embedded EXIF or container metadata
    Metadata,
    /// File system status-change time
    FileSystem,
}

/// Calendar date a media file is considered to have been produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreationDate {
    pub date: NaiveDate,
    pub source: DateSource,
}

impl CreationDate {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// `YYYY-MM-DD`
    pub fn token(&self) -> String {
        format!(
            "{:04}-{:02}-{:02}",
            self.date.year(),
            self.date.month(),
            self.date.day()
        )
    }
}

/// Reads an embedded creation timestamp from a media file
///
/// An `Err` means "no metadata available" and is never fatal; the resolver
/// falls back to the file system.
pub trait MetadataReader {
    fn creation_time(&self, file: &MediaFile) -> Result<NaiveDateTime>;
}

/// Reads EXIF from images and container tags from videos
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedMetadata;

impl MetadataReader for EmbeddedMetadata {
    fn creation_time(&self, file: &MediaFile) -> Result<NaiveDateTime> {
        match file.kind {
            MediaKind::Image => exif::extract_exif_time(&file.path),
            MediaKind::Video => video::extract_video_time(&file.path),
        }
    }
}

/// Resolve the creation date of a file
///
/// Fails only when the file itself has disappeared.
pub fn resolve_date(file: &MediaFile, reader: &dyn MetadataReader) -> Result<CreationDate> {
    let path = &file.path;

    match reader.creation_time(file) {
        Ok(time) => {
            debug!(?path, %time, "Resolved date from metadata");
            return Ok(CreationDate {
                date: time.date(),
                source: DateSource::Metadata,
            });
        }
        Err(e) => {
            debug!(?path, reason = %e, "No usable metadata, using file system time");
        }
    }

    Ok(CreationDate {
        date: filesystem_date(path)?,
        source: DateSource::FileSystem,
    })
}

/// Local calendar date of the file's status-change time
pub fn filesystem_date(path: &Path) -> Result<NaiveDate> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::SourceMissing {
            path: path.to_path_buf(),
        },
        _ => Error::Io(e),
    })?;

    let changed = status_change_time(&metadata)?;
    Ok(changed.with_timezone(&Local).date_naive())
}

#[cfg(unix)]
fn status_change_time(metadata: &fs::Metadata) -> Result<DateTime<chrono::Utc>> {
    use std::os::unix::fs::MetadataExt;

    DateTime::from_timestamp(metadata.ctime(), metadata.ctime_nsec() as u32)
        .ok_or_else(|| Error::TimestampParse {
            source_info: "ctime".to_string(),
            message: format!("{} is out of range", metadata.ctime()),
        })
}

#[cfg(not(unix))]
fn status_change_time(metadata: &fs::Metadata) -> Result<DateTime<chrono::Utc>> {
    let time = metadata.created().or_else(|_| metadata.modified())?;
    Ok(time.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct FixedReader(Option<NaiveDateTime>);

    impl MetadataReader for FixedReader {
        fn creation_time(&self, file: &MediaFile) -> Result<NaiveDateTime> {
            self.0.ok_or_else(|| Error::ExifRead {
                path: file.path.clone(),
                message: "no date tag".to_string(),
            })
        }
    }

    fn media(root: &Path, name: &str) -> MediaFile {
        let path = root.join(name);
        fs::write(&path, b"not really a jpeg").unwrap();
        MediaFile::new(root, path, MediaKind::Image)
    }

    #[test]
    fn test_metadata_wins() {
        let temp_dir = TempDir::new().unwrap();
        let file = media(temp_dir.path(), "beach.jpg");
        let time = NaiveDate::from_ymd_opt(2019, 7, 4)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();

        let date = resolve_date(&file, &FixedReader(Some(time))).unwrap();
        assert_eq!(date.source, DateSource::Metadata);
        assert_eq!(date.year(), 2019);
        assert_eq!(date.token(), "2019-07-04");
    }

    #[test]
    fn test_fallback_uses_status_change_date() {
        let temp_dir = TempDir::new().unwrap();
        let file = media(temp_dir.path(), "img.jpg");

        let date = resolve_date(&file, &FixedReader(None)).unwrap();
        assert_eq!(date.source, DateSource::FileSystem);
        assert_eq!(date.date, filesystem_date(&file.path).unwrap());
    }

    #[test]
    fn test_fallback_on_unparseable_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = media(temp_dir.path(), "broken.jpg");

        let date = resolve_date(&file, &EmbeddedMetadata).unwrap();
        assert_eq!(date.source, DateSource::FileSystem);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let file = MediaFile::new(
            temp_dir.path(),
            temp_dir.path().join("gone.jpg"),
            MediaKind::Image,
        );

        let err = resolve_date(&file, &FixedReader(None)).unwrap_err();
        assert!(matches!(err, Error::SourceMissing { .. }));
    }

    #[test]
    fn test_same_metadata_same_year() {
        let temp_dir = TempDir::new().unwrap();
        let file = media(temp_dir.path(), "twice.jpg");
        let reader = FixedReader(
            NaiveDate::from_ymd_opt(2005, 12, 31).and_then(|d| d.and_hms_opt(23, 59, 59)),
        );

        let first = resolve_date(&file, &reader).unwrap();
        let second = resolve_date(&file, &reader).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.year(), 2005);
    }
}
