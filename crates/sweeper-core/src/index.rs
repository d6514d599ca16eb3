use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::Error;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Metadata for a single repository file, as produced by the scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Repository-relative path; unique within an index.
    pub path: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub size_bytes: u64,
    /// Last modification, POSIX seconds.
    #[serde(default)]
    pub mtime: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub is_test: bool,
}

fn default_kind() -> String {
    "other".to_string()
}

impl FileDescriptor {
    pub fn new(path: &str, kind: &str, size_bytes: u64, mtime: f64) -> Self {
        Self {
            path: path.to_string(),
            kind: kind.to_string(),
            size_bytes,
            mtime,
            language: None,
            is_test: false,
        }
    }

    /// Age in days relative to `now` (POSIX seconds).
    pub fn age_days(&self, now: f64) -> f64 {
        (now - self.mtime) / SECONDS_PER_DAY
    }
}

/// On-disk repository index: scanner metadata plus the ordered file list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoIndex {
    #[serde(default)]
    pub scan_metadata: Map<String, Value>,
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
}

impl RepoIndex {
    pub fn load(path: &Path) -> Result<RepoIndex, Error> {
        if !path.exists() {
            return Err(Error::IndexNotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        let index: RepoIndex = serde_json::from_str(&raw)?;
        debug!("Loaded {} file descriptors from {}", index.files.len(), path.display());
        Ok(index)
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_days_is_fractional() {
        let file = FileDescriptor::new("a.py", "python", 10, 0.0);
        assert_eq!(file.age_days(SECONDS_PER_DAY * 1.5), 1.5);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let file: FileDescriptor = serde_json::from_str(r#"{"path": "x/y.txt"}"#).unwrap();
        assert_eq!(file.kind, "other");
        assert_eq!(file.size_bytes, 0);
        assert!(!file.is_test);
    }

    #[test]
    fn load_missing_index_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = RepoIndex::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::IndexNotFound(_)));
    }

    #[test]
    fn load_malformed_index_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(RepoIndex::load(&path), Err(Error::Json(_))));
    }

    #[test]
    fn save_then_load_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("index.json");
        let index = RepoIndex {
            scan_metadata: Map::new(),
            files: vec![
                FileDescriptor::new("z.md", "doc", 1, 1.0),
                FileDescriptor::new("a.md", "doc", 2, 2.0),
            ],
        };
        index.save(&path).unwrap();
        let loaded = RepoIndex::load(&path).unwrap();
        let paths: Vec<&str> = loaded.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["z.md", "a.md"]);
    }

    #[test]
    fn sub_microsecond_mtimes_survive_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        let mtimes = [1792422880.4345617, 1792422880.4345615, 1700000000.1234567, 0.1 + 0.2];
        let index = RepoIndex {
            scan_metadata: Map::new(),
            files: mtimes
                .iter()
                .enumerate()
                .map(|(i, m)| FileDescriptor::new(&format!("f{}.py", i), "python", 1, *m))
                .collect(),
        };
        index.save(&path).unwrap();
        let loaded = RepoIndex::load(&path).unwrap();
        for (original, reloaded) in index.files.iter().zip(&loaded.files) {
            assert_eq!(original.mtime.to_bits(), reloaded.mtime.to_bits());
        }
    }
}
