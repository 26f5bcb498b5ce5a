//! CLI argument parsing with clap

use crate::config::{Config, FileOperation};
use clap::Parser;
use std::path::PathBuf;

/// Sort photos and videos into /YYYY/Original Folder Names/File
///
/// Each file's year is taken from its EXIF or video metadata, falling back
/// to the file system timestamp. Existing files are never overwritten.
#[derive(Parser, Debug)]
#[command(name = "phosort")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to sort (defaults to the current directory)
    pub directory: Option<PathBuf>,

    /// Replace spaces in file names with "-"
    #[arg(short = 's', long)]
    pub replace_file_spaces: bool,

    /// Replace spaces in directory names with "-"
    #[arg(short = 'd', long)]
    pub replace_directory_spaces: bool,

    /// Rename sorted files to carry their creation date
    #[arg(short = 'r', long)]
    pub rename: bool,

    /// Only sort images
    #[arg(short = 'i', long)]
    pub images_only: bool,

    /// Copy files to the sorted location instead of moving them
    #[arg(short = 'c', long)]
    pub copy: bool,

    /// Only simulate and print the sort, without persisting any change
    #[arg(short = 't', long, visible_alias = "dry-run")]
    pub simulate: bool,

    /// Path to configuration file (TOML format)
    ///
    /// Settings from the file are used as defaults; CLI flags override them.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Write the resolved configuration to this TOML file and exit
    #[arg(long)]
    pub save_config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Write the log file as JSON
    #[arg(long, requires = "log_file")]
    pub json_log: bool,
}

impl Cli {
    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if let Some(ref directory) = self.directory {
            config.root = directory.clone();
        }
        if self.replace_file_spaces {
            config.replace_file_spaces = true;
        }
        if self.replace_directory_spaces {
            config.replace_directory_spaces = true;
        }
        if self.rename {
            config.rename_files = true;
        }
        if self.images_only {
            config.image_only = true;
        }
        if self.copy {
            config.operation = FileOperation::Copy;
        }
        if self.simulate {
            config.dry_run = true;
        }
        if self.verbose {
            config.verbose = true;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}
