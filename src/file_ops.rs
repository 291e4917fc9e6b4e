/**
 * File operations: pick the capture date of a file and rename it in place
 */

use log::{debug, info};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::{dotted_extension, Config};
use crate::error::{RejectedField, RenameError};
use crate::exif::MetadataRecord;
use crate::naming::derive_stem;

/// The single file-system capability the renamer needs.
pub trait FileSystem {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        (**self).rename(from, to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Exec,
    Dry,
}

pub struct RealFileSystem {
    mode: RunMode,
    // Renames simulated in dry-run mode, so later files see the planned tree.
    planned: RefCell<HashSet<PathBuf>>,
    vacated: RefCell<HashSet<PathBuf>>,
}

impl RealFileSystem {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            planned: RefCell::default(),
            vacated: RefCell::default(),
        }
    }

    fn is_taken(&self, path: &Path) -> bool {
        if self.planned.borrow().contains(path) {
            return true;
        }
        path.symlink_metadata().is_ok() && !self.vacated.borrow().contains(path)
    }
}

impl FileSystem for RealFileSystem {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        // fs::rename replaces an existing destination without asking
        if self.is_taken(to) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "destination already exists",
            ));
        }

        match self.mode {
            RunMode::Exec => fs::rename(from, to),
            RunMode::Dry => {
                debug!("Dry run, not renaming '{}'", from.display());
                self.planned.borrow_mut().remove(from);
                self.vacated.borrow_mut().insert(from.to_path_buf());
                self.vacated.borrow_mut().remove(to);
                self.planned.borrow_mut().insert(to.to_path_buf());
                Ok(())
            }
        }
    }
}

/// Where a file should go, and which metadata field decided it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameTarget {
    pub path: PathBuf,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed {
        from: PathBuf,
        to: PathBuf,
        field: String,
    },
    /// The file already carries the name its metadata gives it.
    AlreadyNamed { path: PathBuf },
}

pub struct Renamer<'a, F> {
    config: &'a Config,
    fs: F,
}

impl<'a, F: FileSystem> Renamer<'a, F> {
    pub fn new(config: &'a Config, fs: F) -> Self {
        Self { config, fs }
    }

    /// Work out the new path for `path` without touching the file system.
    ///
    /// Configured fields are tried in order; the first one that is present in
    /// the metadata and parses wins. A present field that fails to parse is
    /// skipped in favour of the next one.
    pub fn resolve(&self, path: &Path, metadata: &MetadataRecord) -> Result<RenameTarget, RenameError> {
        let extension = dotted_extension(path).unwrap_or_default();
        let rule = self
            .config
            .lookup(&extension)
            .ok_or_else(|| RenameError::UnsupportedExtension {
                path: path.to_path_buf(),
                extension: extension.clone(),
            })?;

        let mut rejected = Vec::new();

        for field in &rule.date_fields {
            let Some(value) = metadata.get(&field.name) else {
                continue;
            };

            let raw = value.to_string();
            match derive_stem(&field.date_format, &raw) {
                Ok(stem) => {
                    debug!("{}: {} = {:?} -> {}", path.display(), field.name, raw, stem);
                    return Ok(RenameTarget {
                        path: path.with_file_name(format!("{}{}", stem, extension)),
                        field: field.name.clone(),
                    });
                }
                Err(error) => {
                    debug!("{}: skipping {}: {}", path.display(), field.name, error);
                    rejected.push(RejectedField {
                        field: field.name.clone(),
                        error,
                    });
                }
            }
        }

        Err(RenameError::DateNotFound {
            path: path.to_path_buf(),
            rejected,
        })
    }

    /// Resolve the new name and perform at most one rename.
    pub fn try_rename(&self, path: &Path, metadata: &MetadataRecord) -> Result<RenameOutcome, RenameError> {
        let target = self.resolve(path, metadata)?;

        if target.path == path {
            debug!("'{}' is already named after its capture date", path.display());
            return Ok(RenameOutcome::AlreadyNamed {
                path: path.to_path_buf(),
            });
        }

        self.fs
            .rename(path, &target.path)
            .map_err(|source| RenameError::RenameFailed {
                from: path.to_path_buf(),
                to: target.path.clone(),
                source,
            })?;

        info!("Renamed '{}' to '{}'", path.display(), target.path.display());
        Ok(RenameOutcome::Renamed {
            from: path.to_path_buf(),
            to: target.path,
            field: target.field,
        })
    }
}
