/**
 * Error types shared by the configuration, naming, metadata and rename steps
 */

use exiftool::ExifToolError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A date format that cannot be turned into a parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("date format is empty")]
    Empty,
    #[error("unsupported element {element:?} in date format {layout:?}")]
    Unsupported { layout: String, element: String },
    #[error("invalid strftime date format {layout:?}")]
    Strftime { layout: String },
}

/// Why a metadata value does not fit its date layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueMismatch {
    #[error("expected {expected} digits at {found:?}")]
    Digits { expected: String, found: String },
    #[error("unexpected whitespace at {found:?}")]
    Whitespace { found: String },
    #[error("unexpected trailing input {found:?}")]
    Trailing { found: String },
    #[error(transparent)]
    Chrono(#[from] chrono::ParseError),
}

/// Failure to turn a raw metadata string into a file stem.
#[derive(Debug, Error)]
pub enum StemError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("{value:?} does not match date format {layout:?}: {reason}")]
    Mismatch {
        layout: String,
        value: String,
        reason: ValueMismatch,
    },
}

/// Startup-time configuration errors. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse configuration")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid extension {extension:?}, expected a leading dot such as \".jpeg\"")]
    Extension { extension: String },
    #[error("invalid date format for field {field:?} of {extension:?}")]
    Layout {
        extension: String,
        field: String,
        #[source]
        source: LayoutError,
    },
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to start {}", executable.display())]
    Spawn {
        executable: PathBuf,
        #[source]
        source: ExifToolError,
    },
    #[error("exiftool failed on {}", path.display())]
    ExifTool {
        path: PathBuf,
        #[source]
        source: ExifToolError,
    },
    #[error("no metadata returned for {}", path.display())]
    NoOutput { path: PathBuf },
    #[error("exiftool reported an error for {}: {message}", path.display())]
    Reported { path: PathBuf, message: String },
    #[error("failed to open {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read EXIF data from {}", path.display())]
    Exif {
        path: PathBuf,
        #[source]
        source: exif::Error,
    },
}

/// A configured field that was present in the metadata but did not parse.
#[derive(Debug)]
pub struct RejectedField {
    pub field: String,
    pub error: StemError,
}

/// Per-file failures. These are logged and collected, never fatal.
#[derive(Debug, Error)]
pub enum RenameError {
    #[error("no configuration for extension {extension:?} of {}", path.display())]
    UnsupportedExtension { path: PathBuf, extension: String },
    #[error("could not find a capture date in the metadata of {}{}", path.display(), rejected_suffix(rejected))]
    DateNotFound {
        path: PathBuf,
        rejected: Vec<RejectedField>,
    },
    #[error("metadata extraction failed for {}", path.display())]
    MetadataExtraction {
        path: PathBuf,
        #[source]
        source: MetadataError,
    },
    #[error("could not rename {} to {}", from.display(), to.display())]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RenameError {
    /// The file the error is about.
    pub fn path(&self) -> &Path {
        match self {
            RenameError::UnsupportedExtension { path, .. }
            | RenameError::DateNotFound { path, .. }
            | RenameError::MetadataExtraction { path, .. } => path,
            RenameError::RenameFailed { from, .. } => from,
        }
    }
}

fn rejected_suffix(rejected: &[RejectedField]) -> String {
    if rejected.is_empty() {
        return String::new();
    }
    let fields: Vec<String> = rejected
        .iter()
        .map(|r| format!("{} ({})", r.field, r.error))
        .collect();
    format!(" (unparseable: {})", fields.join(", "))
}

/// The root directory itself could not be traversed.
#[derive(Debug, Error)]
#[error("cannot walk {}", root.display())]
pub struct WalkError {
    pub root: PathBuf,
    #[source]
    pub source: walkdir::Error,
}

/// Render an error together with its chain of causes, `a: b: c`.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
