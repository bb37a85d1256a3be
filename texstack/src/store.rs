//! File storage abstraction.
//!
//! Conversion reads source images and export writes encoded images through
//! [`FileStore`], so both can run against the local disk or an in-memory map.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{ConvertError, ConvertResult};

/// Read, write and sibling lookup for image files.
pub trait FileStore: Send + Sync {
    /// Read a whole file.
    fn read(&self, path: &Path) -> ConvertResult<Vec<u8>>;

    /// Write a whole file, creating parent directories as needed.
    fn write(&self, path: &Path, bytes: &[u8]) -> ConvertResult<()>;

    /// Files in the same directory as `path` whose name is `path`'s stem
    /// followed by anything and `path`'s extension, sorted by path.
    fn list_siblings(&self, path: &Path) -> ConvertResult<Vec<PathBuf>>;
}

/// Split a path into its stem and extension, as used for sibling lookup.
fn stem_and_extension(path: &Path) -> ConvertResult<(String, String)> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ConvertError::InvalidFilePath {
            path: path.to_path_buf(),
            reason: "path has no file name".to_string(),
        })?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    Ok((stem.to_string(), ext.to_string()))
}

/// [`FileStore`] over the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileStore;

impl LocalFileStore {
    pub fn new() -> Self {
        Self
    }
}

impl FileStore for LocalFileStore {
    fn read(&self, path: &Path) -> ConvertResult<Vec<u8>> {
        fs::read(path).map_err(|e| ConvertError::file_path(path, &e))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> ConvertResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ConvertError::file_path(parent, &e))?;
        }
        fs::write(path, bytes).map_err(|e| ConvertError::file_path(path, &e))
    }

    fn list_siblings(&self, path: &Path) -> ConvertResult<Vec<PathBuf>> {
        let (stem, ext) = stem_and_extension(path)?;
        let dir = path.parent().unwrap_or_else(|| Path::new(""));

        let mut name = format!("{}*", glob::Pattern::escape(&stem));
        if !ext.is_empty() {
            name.push('.');
            name.push_str(&glob::Pattern::escape(&ext));
        }
        let pattern = dir.join(name);
        let pattern = pattern.to_str().ok_or_else(|| ConvertError::InvalidFilePath {
            path: path.to_path_buf(),
            reason: "path is not valid UTF-8".to_string(),
        })?;

        let entries = glob::glob(pattern).map_err(|e| ConvertError::InvalidFilePath {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ConvertError::InvalidFilePath {
                path: e.path().to_path_buf(),
                reason: e.error().to_string(),
            })?;
            if entry.is_file() {
                found.push(entry);
            }
        }
        found.sort();
        Ok(found)
    }
}

/// In-process [`FileStore`] backed by a map of path to bytes.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&self, path: impl Into<PathBuf>, bytes: Vec<u8>) {
        self.files.lock().insert(path.into(), bytes);
    }

    /// Copy of a stored file, if present.
    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().get(path).cloned()
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.files.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

impl FileStore for MemoryFileStore {
    fn read(&self, path: &Path) -> ConvertResult<Vec<u8>> {
        self.get(path).ok_or_else(|| ConvertError::InvalidFilePath {
            path: path.to_path_buf(),
            reason: "no such file".to_string(),
        })
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> ConvertResult<()> {
        self.insert(path, bytes.to_vec());
        Ok(())
    }

    fn list_siblings(&self, path: &Path) -> ConvertResult<Vec<PathBuf>> {
        let (stem, ext) = stem_and_extension(path)?;
        let dir = path.parent().unwrap_or_else(|| Path::new(""));

        let files = self.files.lock();
        let mut found: Vec<PathBuf> = files
            .keys()
            .filter(|candidate| candidate.parent().unwrap_or_else(|| Path::new("")) == dir)
            .filter(|candidate| {
                let Ok((candidate_stem, candidate_ext)) = stem_and_extension(candidate) else {
                    return false;
                };
                candidate_ext == ext && candidate_stem.starts_with(&stem)
            })
            .cloned()
            .collect();
        found.sort();
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ========================================================================
    // LocalFileStore
    // ========================================================================

    #[test]
    fn test_local_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new();
        let path = dir.path().join("nested/deeper/out.png");

        store.write(&path, b"abc").unwrap();
        assert_eq!(store.read(&path).unwrap(), b"abc");
    }

    #[test]
    fn test_local_read_missing_is_invalid_file_path() {
        let dir = TempDir::new().unwrap();
        let err = LocalFileStore::new()
            .read(&dir.path().join("nope.png"))
            .unwrap_err();
        assert_eq!(err.code(), 0x06);
    }

    #[test]
    fn test_local_siblings_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["sky_top.png", "sky_left.png", "sky.png", "sky_right.jpg", "other.png"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let siblings = LocalFileStore::new()
            .list_siblings(&dir.path().join("sky.png"))
            .unwrap();
        let names: Vec<String> = siblings
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["sky.png", "sky_left.png", "sky_top.png"]);
    }

    #[test]
    fn test_local_siblings_escape_pattern_characters() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a[1]_0.png"), b"x").unwrap();
        fs::write(dir.path().join("a1_0.png"), b"x").unwrap();
        let siblings = LocalFileStore::new()
            .list_siblings(&dir.path().join("a[1].png"))
            .unwrap();
        assert_eq!(siblings.len(), 1);
        assert!(siblings[0].ends_with("a[1]_0.png"));
    }

    // ========================================================================
    // MemoryFileStore
    // ========================================================================

    #[test]
    fn test_memory_roundtrip() {
        let store = MemoryFileStore::new();
        assert!(store.is_empty());
        store.write(Path::new("out/a.png"), &[1, 2, 3]).unwrap();
        assert_eq!(store.read(Path::new("out/a.png")).unwrap(), vec![1, 2, 3]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.read(Path::new("b.png")).unwrap_err().code(), 0x06);
    }

    #[test]
    fn test_memory_siblings() {
        let store = MemoryFileStore::new();
        store.insert("in/tex_1.png", vec![]);
        store.insert("in/tex_0.png", vec![]);
        store.insert("in/tex_0.exr", vec![]);
        store.insert("other/tex_2.png", vec![]);

        let siblings = store.list_siblings(Path::new("in/tex.png")).unwrap();
        assert_eq!(
            siblings,
            vec![PathBuf::from("in/tex_0.png"), PathBuf::from("in/tex_1.png")]
        );
    }
}
