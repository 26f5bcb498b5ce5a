//! Sort execution
//!
//! Handles the core loop of:
//! - Discovering media files under the root
//! - Resolving each file's creation date
//! - Planning its destination
//! - Moving, copying or simulating, never overwriting

use crate::config::Config;
use crate::error::{Error, Result};
use crate::plan::plan_destination;
use crate::scan::{MediaFile, MediaPatterns, discover};
use crate::time::{CreationDate, EmbeddedMetadata, MetadataReader, resolve_date};
use std::collections::{BTreeSet, HashSet};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{Level, debug, error, info, span, warn};

/// Why a file was left where it is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Destination already exists (or is claimed earlier in a dry run)
    DestinationExists,
    /// Source vanished between discovery and sorting
    SourceMissing,
}

/// Outcome of sorting a single file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Moved,
    Copied,
    Simulated,
    Skipped(SkipReason),
    Failed(String),
}

/// Result of processing a single file
#[derive(Debug, Clone)]
pub struct FileResult {
    /// Source file path
    pub source: PathBuf,
    /// Planned destination (absent if the date could not be resolved)
    pub destination: Option<PathBuf>,
    /// Resolved creation date
    pub date: Option<CreationDate>,
    pub outcome: Outcome,
}

/// Aggregate of one run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Distinct years of every file whose date was resolved
    pub years: BTreeSet<i32>,
    /// Files discovered under the root
    pub discovered: usize,
    /// Files moved or copied
    pub sorted: usize,
    pub simulated: usize,
    /// Files skipped because the destination exists
    pub collisions: usize,
    /// Files that vanished before they could be sorted
    pub missing: usize,
    pub failed: usize,
    /// Stopped early by an interrupt
    pub interrupted: bool,
    pub elapsed: Duration,
}

impl RunReport {
    fn record(&mut self, result: &FileResult) {
        if let Some(date) = &result.date {
            self.years.insert(date.year());
        }
        match &result.outcome {
            Outcome::Moved | Outcome::Copied => self.sorted += 1,
            Outcome::Simulated => self.simulated += 1,
            Outcome::Skipped(SkipReason::DestinationExists) => self.collisions += 1,
            Outcome::Skipped(SkipReason::SourceMissing) => self.missing += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }

    /// `2009, 2010, 2014`
    pub fn years_list(&self) -> String {
        self.years
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn summary(&self) -> String {
        format!(
            "Found: {}, Sorted: {}, Simulated: {}, Existing: {}, Missing: {}, Failed: {}",
            self.discovered,
            self.sorted,
            self.simulated,
            self.collisions,
            self.missing,
            self.failed
        )
    }
}

/// Sorts the media files under a root directory
pub struct Sorter {
    config: Config,
    patterns: MediaPatterns,
    reader: Box<dyn MetadataReader>,
    interrupt: Arc<AtomicBool>,
}

impl Sorter {
    /// Create a sorter reading embedded metadata from the files themselves
    pub fn new(config: Config) -> Result<Self> {
        Self::with_reader(config, Box::new(EmbeddedMetadata))
    }

    /// Create a sorter with a specific metadata reader
    pub fn with_reader(config: Config, reader: Box<dyn MetadataReader>) -> Result<Self> {
        validate_root(&config.root)?;
        let patterns = MediaPatterns::from_config(&config)?;

        Ok(Self {
            config,
            patterns,
            reader,
            interrupt: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Share an interrupt flag; once set, the run stops before the next file
    pub fn with_interrupt(mut self, interrupt: Arc<AtomicBool>) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Discover the media files this run would process
    pub fn discover(&self) -> Vec<MediaFile> {
        discover(&self.config.root, &self.patterns, self.config.image_only)
    }

    /// Run the sort, reporting each file's result to `observer` as it completes
    pub fn run<F>(&self, mut observer: F) -> RunReport
    where
        F: FnMut(&FileResult),
    {
        let _span = span!(Level::INFO, "sort_run", root = ?self.config.root).entered();
        let start = Instant::now();
        let mut report = RunReport::default();

        info!("Searching for media files...");
        let files = self.discover();
        report.discovered = files.len();
        info!(count = files.len(), "Found media files");

        // Destinations taken earlier in this dry run
        let mut claimed: HashSet<PathBuf> = HashSet::new();

        for file in &files {
            if self.interrupt.load(Ordering::SeqCst) {
                warn!("Interrupted, stopping sort");
                report.interrupted = true;
                break;
            }

            let result = self.process_file(file, &mut claimed);
            report.record(&result);
            observer(&result);
        }

        report.elapsed = start.elapsed();
        info!("{}", report.summary());
        report
    }

    fn process_file(&self, file: &MediaFile, claimed: &mut HashSet<PathBuf>) -> FileResult {
        let _file_span = span!(Level::DEBUG, "process_file", path = ?file.path).entered();

        let date = match resolve_date(file, self.reader.as_ref()) {
            Ok(date) => date,
            Err(Error::SourceMissing { path }) => {
                warn!(?path, "File disappeared before it could be sorted");
                return FileResult {
                    source: file.path.clone(),
                    destination: None,
                    date: None,
                    outcome: Outcome::Skipped(SkipReason::SourceMissing),
                };
            }
            Err(e) => {
                error!(path = ?file.path, error = %e, "Failed to resolve date");
                return FileResult {
                    source: file.path.clone(),
                    destination: None,
                    date: None,
                    outcome: Outcome::Failed(e.to_string()),
                };
            }
        };

        let destination = self.config.root.join(plan_destination(file, &date, &self.config));
        debug!(?destination, source = ?date.source, "Planned destination");

        let outcome = if self.config.dry_run && !claimed.insert(destination.clone()) {
            Outcome::Skipped(SkipReason::DestinationExists)
        } else {
            execute(&file.path, &destination, &self.config)
        };

        FileResult {
            source: file.path.clone(),
            destination: Some(destination),
            date: Some(date),
            outcome,
        }
    }
}

/// The sort root must be an existing directory
pub fn validate_root(root: &Path) -> Result<()> {
    if !root.exists() {
        return Err(Error::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(Error::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    Ok(())
}

/// Move, copy or simulate one file; an existing destination is never touched
pub fn execute(source: &Path, destination: &Path, config: &Config) -> Outcome {
    if destination.exists() {
        debug!(?source, ?destination, "Destination exists, skipping");
        return Outcome::Skipped(SkipReason::DestinationExists);
    }

    if !source.exists() {
        warn!(?source, "File disappeared before it could be sorted");
        return Outcome::Skipped(SkipReason::SourceMissing);
    }

    if config.dry_run {
        info!(?source, ?destination, "Would sort file");
        return Outcome::Simulated;
    }

    match perform_file_operation(source, destination, config) {
        Ok(outcome) => {
            info!(?source, ?destination, "Sorted file");
            outcome
        }
        Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound && !source.exists() => {
            warn!(?source, "File disappeared while being sorted");
            Outcome::Skipped(SkipReason::SourceMissing)
        }
        Err(e) => {
            error!(?source, ?destination, error = %e, "Failed to sort file");
            Outcome::Failed(e.to_string())
        }
    }
}

/// Create parent directories, then move or copy
fn perform_file_operation(source: &Path, destination: &Path, config: &Config) -> Result<Outcome> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    if config.is_copy() {
        copy_file(source, destination)?;
        return Ok(Outcome::Copied);
    }

    move_file(source, destination)?;
    Ok(Outcome::Moved)
}

/// Rename, or copy then delete when the destination is on another filesystem
fn move_file(source: &Path, destination: &Path) -> Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            debug!(?source, error = %e, "Rename across filesystems, copying instead");
            copy_file(source, destination)?;
            remove_source_or_rollback(source, destination, |path| fs::remove_file(path))
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete the moved source; if that fails the copy is discarded so the file
/// exists in one place only
fn remove_source_or_rollback(
    source: &Path,
    destination: &Path,
    remove: impl FnOnce(&Path) -> io::Result<()>,
) -> Result<()> {
    if let Err(e) = remove(source) {
        discard(destination);
        return Err(e.into());
    }
    Ok(())
}

/// Copy contents, permissions and timestamps; a failed copy leaves nothing behind
fn copy_file(source: &Path, destination: &Path) -> Result<()> {
    let source_file = File::open(source)?;
    let metadata = source_file.metadata()?;
    let mut reader = BufReader::with_capacity(256 * 1024, source_file);
    // create_new so a destination that appeared meanwhile is never overwritten
    let dest_file = File::options()
        .write(true)
        .create_new(true)
        .open(destination)?;

    let copied = write_contents(&mut reader, dest_file)
        .and_then(|()| apply_metadata(destination, &metadata));
    if let Err(e) = copied {
        discard(destination);
        return Err(e.into());
    }
    Ok(())
}

fn apply_metadata(destination: &Path, metadata: &fs::Metadata) -> io::Result<()> {
    fs::set_permissions(destination, metadata.permissions())?;
    filetime::set_file_times(
        destination,
        filetime::FileTime::from_last_access_time(metadata),
        filetime::FileTime::from_last_modification_time(metadata),
    )
}

/// Remove a destination this run created
fn discard(destination: &Path) {
    if let Err(cleanup) = fs::remove_file(destination) {
        warn!(?destination, error = %cleanup, "Failed to remove partial copy");
    }
}

fn write_contents(reader: &mut impl Read, file: File) -> io::Result<()> {
    let mut writer = BufWriter::with_capacity(256 * 1024, file);
    io::copy(reader, &mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()
}
