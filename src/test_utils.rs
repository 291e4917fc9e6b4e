//! Shared fixtures for unit tests: a small configuration, an in-memory
//! metadata source and a file system that records renames.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::MetadataError;
use crate::exif::{MetadataRecord, MetadataSource};
use crate::file_ops::FileSystem;

pub const TEST_CONFIG: &str = r#"
- extension: .jpeg
  dateFields:
    - name: RandomKey
      dateFormat: "2006:01:02 15:04:05"
    - name: CreateDate
      dateFormat: "2006:01:02 15:04:05"
- extension: .mov
  dateFields:
    - name: CreationDate
      dateFormat: "2006:01:02 15:04:05-07:00"
"#;

pub fn test_config() -> Config {
    Config::from_yaml(TEST_CONFIG).unwrap()
}

/// Metadata keyed by file name; unknown files get an empty record.
#[derive(Default)]
pub struct FakeMetadata {
    by_name: HashMap<String, MetadataRecord>,
    pub requested: Vec<PathBuf>,
}

impl FakeMetadata {
    pub fn with(mut self, file_name: &str, record: MetadataRecord) -> Self {
        self.by_name.insert(file_name.to_string(), record);
        self
    }
}

impl MetadataSource for FakeMetadata {
    fn extract(&mut self, path: &Path) -> Result<MetadataRecord, MetadataError> {
        self.requested.push(path.to_path_buf());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut record = self.by_name.get(&name).cloned().unwrap_or_default();
        record.file_path = path.to_path_buf();
        Ok(record)
    }
}

/// Records every rename; optionally fails all of them.
#[derive(Default)]
pub struct RecordingFileSystem {
    renames: RefCell<Vec<(PathBuf, PathBuf)>>,
    fail_with: Option<io::ErrorKind>,
}

impl RecordingFileSystem {
    pub fn failing(kind: io::ErrorKind) -> Self {
        Self {
            fail_with: Some(kind),
            ..Self::default()
        }
    }

    pub fn renames(&self) -> Vec<(PathBuf, PathBuf)> {
        self.renames.borrow().clone()
    }
}

impl FileSystem for RecordingFileSystem {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        if let Some(kind) = self.fail_with {
            return Err(io::Error::new(kind, "refused by test file system"));
        }
        self.renames
            .borrow_mut()
            .push((from.to_path_buf(), to.to_path_buf()));
        Ok(())
    }
}
