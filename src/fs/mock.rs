// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir,
}

/// In-memory filesystem for tests.
///
/// Paths are compared verbatim; tests should use the same (usually absolute)
/// spelling for writes and reads.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    read_only: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(PathBuf::from("."), MockEntry::Dir);

        Self {
            entries: Arc::new(Mutex::new(entries)),
            read_only: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut entries = self.entries.lock().unwrap();
        if let Some(parent) = path.parent() {
            Self::ensure_dirs(&mut entries, parent);
        }
        entries.insert(path, MockEntry::File(content.into()));
    }

    /// Contents of a file as UTF-8, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        let entries = self.entries.lock().unwrap();
        match entries.get(path.as_ref()) {
            Some(MockEntry::File(bytes)) => String::from_utf8(bytes.clone()).ok(),
            _ => None,
        }
    }

    /// Make every write at or below `path` fail.
    pub fn deny_writes(&self, path: impl AsRef<Path>) {
        self.read_only
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf());
    }

    fn is_denied(&self, path: &Path) -> bool {
        let denied = self.read_only.lock().unwrap();
        path.ancestors().any(|p| denied.contains(p))
    }

    fn ensure_dirs(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        for dir in path.ancestors() {
            if dir.as_os_str().is_empty() {
                continue;
            }
            entries
                .entry(dir.to_path_buf())
                .or_insert(MockEntry::Dir);
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::File(content)) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if self.is_denied(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        if matches!(self.entries.lock().unwrap().get(path), Some(MockEntry::Dir)) {
            return Err(anyhow!("Is a directory: {:?}", path));
        }
        self.add_file(path, contents);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        if self.is_denied(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        let mut entries = self.entries.lock().unwrap();
        if let Some(MockEntry::File(_)) = entries.get(path) {
            return Err(anyhow!("File exists: {:?}", path));
        }
        Self::ensure_dirs(&mut entries, path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.entries.lock().unwrap().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let entries = self.entries.lock().unwrap();
        matches!(entries.get(path), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let entries = self.entries.lock().unwrap();
        matches!(entries.get(path), Some(MockEntry::Dir))
    }
}
