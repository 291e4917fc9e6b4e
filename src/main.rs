/**
 * media-renamer: rename photos and videos after the capture date in their metadata
 */

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

use media_renamer::config::Config;
use media_renamer::error::error_chain;
use media_renamer::exif::{ExifReader, ExifTool, MetadataSource};
use media_renamer::file_ops::{RealFileSystem, RunMode};
use media_renamer::walk::{Summary, TreeProcessor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Reader {
    /// Long-running exiftool process (photos and videos)
    Exiftool,
    /// Built-in EXIF decoder (JPEG, TIFF, HEIF and raw images only)
    Exif,
}

#[derive(Parser)]
#[command(name = "media-renamer")]
#[command(version)]
#[command(about = "Rename photos and videos after their capture date")]
#[command(long_about = "Walks a directory tree and renames every supported photo and video to
YYYY_MM_DD_HH_MM_SS<ext>, using the first configured metadata field that holds
a readable date.

Files that are hidden, have an unknown extension, or carry no usable date are
left untouched. Existing files are never overwritten.")]
struct Cli {
    /// Root directory to process
    path: PathBuf,

    /// Increase verbosity (-v=INFO, -vv=DEBUG, -vvv=TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// YAML file mapping extensions to date fields (default: bundled table)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log the renames without performing them
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Where metadata is read from
    #[arg(long, value_enum, default_value_t = Reader::Exiftool)]
    reader: Reader,

    /// exiftool executable
    #[arg(long, default_value = "exiftool")]
    exiftool: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose)?;

    info!("Starting media-renamer on {}", cli.path.display());

    let config = match &cli.config {
        Some(path) => Config::load(path),
        None => Config::bundled(),
    }
    .context("Invalid configuration")?;
    debug!("Supported extensions: {:?}", config.supported_extensions());

    let source: Box<dyn MetadataSource> = match cli.reader {
        Reader::Exiftool => Box::new(
            ExifTool::spawn(&cli.exiftool).context("Could not start exiftool, install it or pass --reader exif")?,
        ),
        Reader::Exif => Box::new(ExifReader::new()),
    };

    let mode = if cli.dry_run { RunMode::Dry } else { RunMode::Exec };
    let mut processor = TreeProcessor::new(&config, source, RealFileSystem::new(mode))
        .with_progress(cli.verbose == 0);

    let summary = processor
        .process_tree(&cli.path)
        .context("Walk aborted")?;

    print_summary(&summary, cli.dry_run);
    Ok(())
}

fn setup_logging(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}

fn print_summary(summary: &Summary, dry_run: bool) {
    println!("\nProcessing complete!");
    if dry_run {
        println!("Dry run, nothing was renamed");
    }
    println!("Files processed: {}", summary.processed());
    println!("Files renamed: {}", summary.renamed.len());
    println!("Already named: {}", summary.already_named);
    println!("Files ignored: {}", summary.ignored);
    println!("Errors: {}", summary.failures.len() + summary.walk_errors);

    if !summary.failures.is_empty() {
        println!("\nErrors:");
        for failure in &summary.failures {
            println!("  {}: {}", failure.path().display(), error_chain(failure));
        }
    }
}
