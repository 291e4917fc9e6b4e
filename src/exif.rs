/**
 * Metadata extraction
 *
 * Two sources produce the same field-name -> value records:
 * 1. exiftool through the `exiftool` crate (all formats, exiftool tag names)
 * 2. kamadak-exif (pure Rust, JPEG/TIFF/HEIF/PNG containers, no subprocess)
 */

use log::debug;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use exif::{In, Reader as ExifDecoder, Value as ExifValue};

use crate::error::MetadataError;

/// A scalar metadata value. Only its string form is ever parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Integer(n) => write!(f, "{}", n),
            MetadataValue::Float(n) => write!(f, "{}", n),
            MetadataValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<Value> for MetadataValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => MetadataValue::Text(s),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => MetadataValue::Integer(i),
                (None, Some(f)) => MetadataValue::Float(f),
                (None, None) => MetadataValue::Text(n.to_string()),
            },
            other => MetadataValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Integer(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

/// Metadata of one file. `error` carries a per-file failure reported by the
/// extraction tool itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataRecord {
    pub file_path: PathBuf,
    pub fields: HashMap<String, MetadataValue>,
    pub error: Option<String>,
}

impl MetadataRecord {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<MetadataValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&MetadataValue> {
        self.fields.get(name)
    }

    /// Build a record from one object of `exiftool -json` output.
    pub fn from_exiftool_object(path: &Path, object: Map<String, Value>) -> Self {
        let mut record = Self::new(path);
        for (key, value) in object {
            match key.as_str() {
                "SourceFile" => {
                    if let Value::String(source) = value {
                        record.file_path = PathBuf::from(source);
                    }
                }
                "Error" => record.error = Some(MetadataValue::from(value).to_string()),
                _ => {
                    record.fields.insert(key, MetadataValue::from(value));
                }
            }
        }
        record
    }
}

/// Where metadata comes from. Takes `&mut self` because a source may own a
/// long-running child process.
pub trait MetadataSource {
    fn extract(&mut self, path: &Path) -> Result<MetadataRecord, MetadataError>;
}

impl<T: MetadataSource + ?Sized> MetadataSource for &mut T {
    fn extract(&mut self, path: &Path) -> Result<MetadataRecord, MetadataError> {
        (**self).extract(path)
    }
}

impl<T: MetadataSource + ?Sized> MetadataSource for Box<T> {
    fn extract(&mut self, path: &Path) -> Result<MetadataRecord, MetadataError> {
        (**self).extract(path)
    }
}

/// A long-running exiftool process, started once and reused for every file.
pub struct ExifTool {
    inner: exiftool::ExifTool,
}

impl ExifTool {
    pub fn spawn(executable: &Path) -> Result<Self, MetadataError> {
        let inner = exiftool::ExifTool::with_executable(executable).map_err(|source| {
            MetadataError::Spawn {
                executable: executable.to_path_buf(),
                source,
            }
        })?;
        debug!("Started exiftool ({})", executable.display());
        Ok(Self { inner })
    }
}

/// Turn the `-json` output for one file into a record. exiftool answers with
/// an array holding one object per file.
pub fn record_from_json(path: &Path, output: Value) -> Result<MetadataRecord, MetadataError> {
    let object = match output {
        Value::Array(objects) => objects.into_iter().next(),
        other => Some(other),
    };

    match object {
        Some(Value::Object(object)) => Ok(MetadataRecord::from_exiftool_object(path, object)),
        _ => Err(MetadataError::NoOutput {
            path: path.to_path_buf(),
        }),
    }
}

impl MetadataSource for ExifTool {
    fn extract(&mut self, path: &Path) -> Result<MetadataRecord, MetadataError> {
        let output = self
            .inner
            .json(path, &[])
            .map_err(|source| MetadataError::ExifTool {
                path: path.to_path_buf(),
                source,
            })?;

        let record = record_from_json(path, output)?;
        debug!("exiftool returned {} fields for {}", record.fields.len(), path.display());
        Ok(record)
    }
}

/// kamadak-exif tag names mapped to the names exiftool uses, so one
/// configuration works with either source.
const EXIFTOOL_ALIASES: &[(&str, &str)] = &[
    ("DateTimeDigitized", "CreateDate"),
    ("DateTime", "ModifyDate"),
];

/// In-process reader backed by kamadak-exif.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifReader;

impl ExifReader {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataSource for ExifReader {
    fn extract(&mut self, path: &Path) -> Result<MetadataRecord, MetadataError> {
        let file = File::open(path).map_err(|source| MetadataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut bufreader = BufReader::new(&file);

        let exif = ExifDecoder::new()
            .read_from_container(&mut bufreader)
            .map_err(|source| MetadataError::Exif {
                path: path.to_path_buf(),
                source,
            })?;

        let mut record = MetadataRecord::new(path);
        for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
            let value = match field.value {
                // display_value() would wrap ASCII in quotes
                ExifValue::Ascii(ref parts) if !parts.is_empty() => {
                    String::from_utf8_lossy(&parts[0]).trim_end_matches('\0').to_string()
                }
                _ => field.display_value().to_string(),
            };
            record.fields.insert(field.tag.to_string(), MetadataValue::Text(value));
        }

        for (kamadak_name, exiftool_name) in EXIFTOOL_ALIASES {
            if let Some(value) = record.fields.get(*kamadak_name).cloned() {
                record
                    .fields
                    .entry(exiftool_name.to_string())
                    .or_insert(value);
            }
        }

        debug!("kamadak-exif returned {} fields for {}", record.fields.len(), path.display());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_string_forms() {
        assert_eq!(MetadataValue::from(json!("2019:08:05 14:12:13")).to_string(), "2019:08:05 14:12:13");
        assert_eq!(MetadataValue::from(json!(2019)), MetadataValue::Integer(2019));
        assert_eq!(MetadataValue::from(json!(2.5)).to_string(), "2.5");
        assert_eq!(MetadataValue::from(json!(true)).to_string(), "true");
        assert_eq!(MetadataValue::from(json!([1, 2])).to_string(), "[1,2]");
    }

    #[test]
    fn test_record_from_exiftool_object() {
        let object = json!({
            "SourceFile": "photos/IMG_0001.jpeg",
            "CreateDate": "2019:08:05 14:12:13",
            "ImageWidth": 4032,
        });
        let Value::Object(object) = object else { unreachable!() };

        let record = MetadataRecord::from_exiftool_object(Path::new("IMG_0001.jpeg"), object);
        assert_eq!(record.file_path, PathBuf::from("photos/IMG_0001.jpeg"));
        assert_eq!(record.get("CreateDate"), Some(&MetadataValue::from("2019:08:05 14:12:13")));
        assert_eq!(record.get("ImageWidth"), Some(&MetadataValue::Integer(4032)));
        assert!(record.get("SourceFile").is_none());
        assert!(record.error.is_none());
    }

    #[test]
    fn test_record_keeps_exiftool_error() {
        let Value::Object(object) = json!({
            "SourceFile": "notes.jpeg",
            "Error": "File format error",
        }) else {
            unreachable!()
        };

        let record = MetadataRecord::from_exiftool_object(Path::new("notes.jpeg"), object);
        assert_eq!(record.error.as_deref(), Some("File format error"));
        assert!(record.fields.is_empty());
    }

    #[test]
    fn test_record_from_json_array() {
        let output = json!([{
            "SourceFile": "clip.mov",
            "CreationDate": "2015:07:15 13:56:17+02:00",
        }]);
        let record = record_from_json(Path::new("clip.mov"), output).unwrap();
        assert_eq!(
            record.get("CreationDate").map(ToString::to_string).as_deref(),
            Some("2015:07:15 13:56:17+02:00")
        );
    }

    #[test]
    fn test_record_from_json_single_object() {
        let output = json!({"SourceFile": "a.jpeg", "CreateDate": "2019:08:05 14:12:13"});
        let record = record_from_json(Path::new("a.jpeg"), output).unwrap();
        assert!(record.get("CreateDate").is_some());
    }

    #[test]
    fn test_record_from_json_without_object() {
        for output in [json!([]), json!("text"), json!(null)] {
            let err = record_from_json(Path::new("a.jpeg"), output).unwrap_err();
            assert!(matches!(err, MetadataError::NoOutput { .. }));
        }
    }

    #[test]
    fn test_missing_exiftool_binary() {
        let result = ExifTool::spawn(Path::new("/nonexistent/exiftool-binary"));
        assert!(matches!(result, Err(MetadataError::Spawn { .. })));
    }

    #[test]
    fn test_exif_reader_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.jpg");
        std::fs::write(&path, b"not really a jpeg").unwrap();

        let result = ExifReader::new().extract(&path);
        assert!(matches!(result, Err(MetadataError::Exif { .. })));
    }

    #[test]
    fn test_exif_reader_missing_file() {
        let result = ExifReader::new().extract(Path::new("/nonexistent/photo.jpg"));
        assert!(matches!(result, Err(MetadataError::Io { .. })));
    }
}
