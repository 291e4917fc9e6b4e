/**
 * Directory walk: filter candidates, read their metadata, rename them
 */

use indicatif::{ProgressBar, ProgressStyle};
use log::{info, trace, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{error_chain, MetadataError, RenameError, WalkError};
use crate::exif::MetadataSource;
use crate::file_ops::{FileSystem, RenameOutcome, Renamer};

/// True for directories, unsupported extensions and hidden files.
pub fn should_ignore(path: &Path, is_dir: bool, config: &Config) -> bool {
    if is_dir {
        return true;
    }

    if !config.is_supported(path) {
        return true;
    }

    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

/// What happened during one run.
#[derive(Debug, Default)]
pub struct Summary {
    pub renamed: Vec<(PathBuf, PathBuf)>,
    pub already_named: usize,
    pub ignored: usize,
    pub walk_errors: usize,
    pub failures: Vec<RenameError>,
}

impl Summary {
    pub fn processed(&self) -> usize {
        self.renamed.len() + self.already_named + self.failures.len()
    }

    fn record(&mut self, result: Result<RenameOutcome, RenameError>) {
        match result {
            Ok(RenameOutcome::Renamed { from, to, .. }) => self.renamed.push((from, to)),
            Ok(RenameOutcome::AlreadyNamed { .. }) => self.already_named += 1,
            Err(err) => self.failures.push(err),
        }
    }
}

pub struct TreeProcessor<'a, M, F> {
    config: &'a Config,
    source: M,
    renamer: Renamer<'a, F>,
    show_progress: bool,
}

impl<'a, M: MetadataSource, F: FileSystem> TreeProcessor<'a, M, F> {
    pub fn new(config: &'a Config, source: M, fs: F) -> Self {
        Self {
            config,
            source,
            renamer: Renamer::new(config, fs),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Rename every supported file below `root`.
    ///
    /// Only a failure to read `root` itself is returned as an error; anything
    /// that goes wrong for a single entry is logged, counted in the summary,
    /// and the walk moves on.
    pub fn process_tree(&mut self, root: &Path) -> Result<Summary, WalkError> {
        let mut summary = Summary::default();
        let candidates = self.collect_candidates(root, &mut summary)?;
        info!("Found {} candidate files in {}", candidates.len(), root.display());

        let pb = if self.show_progress {
            let pb = ProgressBar::new(candidates.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb.set_message("Renaming files");
            pb
        } else {
            ProgressBar::hidden()
        };

        for path in candidates {
            let result = self.process_file(&path);
            if let Err(err) = &result {
                pb.suspend(|| warn!("{}", error_chain(err)));
            }
            summary.record(result);
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(summary)
    }

    /// Metadata lookup and rename for one file that passed the filter.
    pub fn process_file(&mut self, path: &Path) -> Result<RenameOutcome, RenameError> {
        let record = self
            .source
            .extract(path)
            .map_err(|source| RenameError::MetadataExtraction {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(message) = record.error.clone() {
            return Err(RenameError::MetadataExtraction {
                path: path.to_path_buf(),
                source: MetadataError::Reported {
                    path: path.to_path_buf(),
                    message,
                },
            });
        }

        self.renamer.try_rename(path, &record)
    }

    // Sorting makes walkdir read each directory completely before yielding
    // from it, and all candidates are gathered before the first rename.
    fn collect_candidates(&self, root: &Path, summary: &mut Summary) -> Result<Vec<PathBuf>, WalkError> {
        let mut candidates = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(WalkError {
                        root: root.to_path_buf(),
                        source: err,
                    })
                }
                Err(err) => {
                    warn!("Skipping unreadable entry: {}", error_chain(&err));
                    summary.walk_errors += 1;
                    continue;
                }
            };

            let is_dir = entry.file_type().is_dir();
            if should_ignore(entry.path(), is_dir, self.config) {
                if !is_dir {
                    trace!("Ignoring {}", entry.path().display());
                    summary.ignored += 1;
                }
                continue;
            }

            candidates.push(entry.into_path());
        }

        Ok(candidates)
    }
}
