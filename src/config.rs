/**
 * Extension table: where each file type keeps its capture date
 */

use log::{debug, warn};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::layout::Layout;

const BUNDLED_CONFIG: &str = include_str!("../config/default.yml");

/// A metadata field that may hold the capture date, and how to read it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFieldRule {
    pub name: String,
    pub date_format: String,
}

/// Candidate date fields for one extension, in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTypeRule {
    pub extension: String,
    pub date_fields: Vec<DateFieldRule>,
}

/// Immutable after loading; shared by reference with the walker and renamer.
#[derive(Debug, Clone)]
pub struct Config {
    file_types: Vec<FileTypeRule>,
}

impl Config {
    /// Validate the rules: every extension has its leading dot and every
    /// date format compiles.
    pub fn new(file_types: Vec<FileTypeRule>) -> Result<Self, ConfigError> {
        let mut seen = BTreeSet::new();

        for file_type in &file_types {
            let extension = &file_type.extension;
            if extension.len() < 2 || !extension.starts_with('.') {
                return Err(ConfigError::Extension {
                    extension: extension.clone(),
                });
            }

            if !seen.insert(extension.as_str()) {
                warn!("Extension {} is configured more than once, the first entry wins", extension);
            }

            if file_type.date_fields.is_empty() {
                warn!("Extension {} has no date fields, its files will never be renamed", extension);
            }

            for field in &file_type.date_fields {
                Layout::parse(&field.date_format).map_err(|source| ConfigError::Layout {
                    extension: extension.clone(),
                    field: field.name.clone(),
                    source,
                })?;
            }
        }

        debug!("Loaded configuration for {} extensions", file_types.len());
        Ok(Self { file_types })
    }

    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        let file_types: Vec<FileTypeRule> = serde_yaml::from_str(source)?;
        Self::new(file_types)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Reading configuration from {}", path.display());
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&source)
    }

    /// The table compiled into the binary.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_yaml(BUNDLED_CONFIG)
    }

    pub fn file_types(&self) -> &[FileTypeRule] {
        &self.file_types
    }

    /// Exact, case-sensitive match on the extension including its dot.
    pub fn lookup(&self, extension: &str) -> Option<&FileTypeRule> {
        self.file_types.iter().find(|f| f.extension == extension)
    }

    pub fn supported_extensions(&self) -> BTreeSet<&str> {
        self.file_types.iter().map(|f| f.extension.as_str()).collect()
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        dotted_extension(path).is_some_and(|ext| self.lookup(&ext).is_some())
    }
}

/// The extension of `path` with its leading dot, case preserved (`.JPG`).
pub fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
}
