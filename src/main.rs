//! phosort - sort photos and videos into a year based hierarchy
//!
//! A CLI tool that moves each media file under a directory into
//! `/YYYY/Original Folder Names/File`, using its EXIF or video metadata
//! date and falling back to the file system timestamp.

use anyhow::{Context, Result};
use clap::Parser;
use phosort::process::{FileResult, Outcome, RunReport, SkipReason};
use phosort::signal::setup_shutdown_signal;
use phosort::{Cli, Config, Sorter};
use std::path::Path;
use tracing::{Level, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// CLI Output Module
mod cli_output {
    //! Console styling for the banner, per-file lines and the summary

    use crossterm::{
        ExecutableCommand,
        style::{Color, Print, Stylize, style},
    };
    use std::io::stdout;

    /// CLI theme colors
    pub struct CliTheme;

    impl CliTheme {
        pub const SUCCESS: Color = Color::Green;
        pub const WARNING: Color = Color::Yellow;
        pub const ERROR: Color = Color::Red;
        pub const HINT: Color = Color::DarkGrey;
        pub const ACCENT: Color = Color::Cyan;
    }

    /// Title framed by `=` lines of the same width
    pub fn print_title(title: &str) {
        let rule = "=".repeat(title.len());
        let _ = stdout().execute(Print(format!("\n{}\n", rule)));
        let _ = stdout().execute(Print(format!("{}\n", title.bold())));
        let _ = stdout().execute(Print(format!("{}\n\n", rule)));
    }

    pub fn print_section(title: &str) {
        let _ = stdout().execute(Print(format!("\n{}\n", style(title).with(CliTheme::ACCENT))));
    }

    pub fn print_warning(msg: &str) {
        let _ = stdout().execute(Print(style("⚠ ").with(CliTheme::WARNING).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    /// Key/value pair with the key padded to `width`
    pub fn print_key_value(key: &str, value: &str, width: usize) {
        let key_styled = style(format!("{:<width$}", key, width = width)).with(CliTheme::HINT);
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(key_styled));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(style(value).bold()));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_stat(key: &str, value: &str, color: Color) {
        let key_styled = style(key).with(CliTheme::HINT);
        let value_styled = style(value).with(color).bold();
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(key_styled));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(value_styled));
        let _ = stdout().execute(Print("\n"));
    }

    /// `source ---> destination` with a colored arrow
    pub fn print_result(arrow: &str, color: Color, source: &str, dest_or_msg: &str) {
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style(source).italic()));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(style(arrow).with(color).bold()));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(style(dest_or_msg).with(CliTheme::HINT)));
        let _ = stdout().execute(Print("\n"));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = setup_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "phosort starting");

    let config = load_config(&cli)?;

    if let Some(ref path) = cli.save_config {
        config
            .save_to_file(path)
            .with_context(|| format!("Failed to save configuration to {}", path.display()))?;
        println!("Configuration saved to {}", path.display());
        return Ok(());
    }

    // Validates the directory before anything is discovered
    let sorter = Sorter::new(config)?;

    print_banner(sorter.config());

    match setup_shutdown_signal() {
        Ok(interrupt) => {
            let sorter = sorter.with_interrupt(interrupt);
            run(&sorter);
        }
        Err(e) => {
            warn!(error = %e, "Failed to install Ctrl-C handler");
            run(&sorter);
        }
    }

    Ok(())
}

fn run(sorter: &Sorter) {
    use cli_output::*;

    print_section("Begin sort...");
    let report = sorter.run(|result| print_file_result(sorter.config(), result));
    print_summary(sorter.config(), &report);
}

/// Load configuration from file or CLI arguments
fn load_config(cli: &Cli) -> Result<Config> {
    let config = if let Some(ref config_path) = cli.config {
        info!(config_file = %config_path.display(), "Loading configuration from file");
        let file_config = Config::load_from_file(config_path)?;
        cli.merge_with_config(file_config)
    } else {
        cli.to_config()
    };

    if config.verbose {
        info!(?config, "Configuration loaded");
    }

    Ok(config)
}

/// Console logging on stderr, plus an optional log file
fn setup_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.log_file.is_some() {
        Level::INFO
    } else {
        Level::WARN
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr));

    let Some(ref log_path) = cli.log_file else {
        subscriber.init();
        return Ok(None);
    };

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    if cli.json_log {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .init();
    }

    Ok(Some(guard))
}

fn print_banner(config: &Config) {
    use cli_output::*;

    const WIDTH: usize = 25;
    let flag = |b: bool| if b { "yes" } else { "no" };

    print_title("BEGIN phosort");
    print_key_value("Sort directory:", &config.root.display().to_string(), WIDTH);
    print_key_value("Replace file spaces:", flag(config.replace_file_spaces), WIDTH);
    print_key_value("Replace directory spaces:", flag(config.replace_directory_spaces), WIDTH);
    print_key_value("Rename files:", flag(config.rename_files), WIDTH);
    print_key_value("Image only sort:", flag(config.image_only), WIDTH);
    print_key_value("File copy:", flag(config.is_copy()), WIDTH);
    print_key_value("Simulate only:", flag(config.dry_run), WIDTH);
}

fn print_file_result(config: &Config, result: &FileResult) {
    use cli_output::*;

    let source = display_relative(&config.root, &result.source);
    let destination = result
        .destination
        .as_deref()
        .map(|d| display_relative(&config.root, d))
        .unwrap_or_default();

    match &result.outcome {
        Outcome::Moved => print_result("--->", CliTheme::SUCCESS, &source, &destination),
        Outcome::Copied => print_result("-+->", CliTheme::SUCCESS, &source, &destination),
        Outcome::Simulated => print_result("-!->", CliTheme::ACCENT, &source, &destination),
        Outcome::Skipped(SkipReason::DestinationExists) => print_result(
            "-x->",
            CliTheme::WARNING,
            &source,
            &format!("{} (already exists)", destination),
        ),
        Outcome::Skipped(SkipReason::SourceMissing) => {
            print_result("-?->", CliTheme::WARNING, &source, "(no longer exists)")
        }
        Outcome::Failed(message) => print_result("-x->", CliTheme::ERROR, &source, message),
    }
}

fn print_summary(config: &Config, report: &RunReport) {
    use cli_output::*;

    if report.interrupted {
        print_warning("Interrupted: the report covers the files handled so far");
    }

    print_section("Summary");
    print_stat("Number of files found", &report.discovered.to_string(), CliTheme::ACCENT);
    if config.dry_run {
        print_stat("Number of files simulated", &report.simulated.to_string(), CliTheme::ACCENT);
    } else if config.is_copy() {
        print_stat("Number of files copied", &report.sorted.to_string(), CliTheme::SUCCESS);
    } else {
        print_stat("Number of files moved", &report.sorted.to_string(), CliTheme::SUCCESS);
    }
    print_stat("Already in place", &report.collisions.to_string(), CliTheme::WARNING);
    if report.missing > 0 {
        print_stat("Vanished before sorting", &report.missing.to_string(), CliTheme::WARNING);
    }
    if report.failed > 0 {
        print_stat("Failed", &report.failed.to_string(), CliTheme::ERROR);
    }

    let years_label = if config.dry_run { "Years found" } else { "Years sorted" };
    print_stat(years_label, &report.years_list(), CliTheme::ACCENT);
    print_stat(
        "Time elapsed",
        &format!("{:.3}s", report.elapsed.as_secs_f64()),
        CliTheme::HINT,
    );

    if config.dry_run {
        print_warning("Simulation only: no files were changed");
    }

    print_title("END phosort");
}

/// Path relative to the sort root for display
fn display_relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
