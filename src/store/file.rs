// src/store/file.rs

//! JSON-file parameter store.
//!
//! Layout on disk:
//!
//! ```json
//! {
//!   "my-stack": {
//!     "tap_config": "{...}",
//!     "target_config": "{...}"
//!   }
//! }
//! ```
//!
//! A missing document is an empty store. Writes rewrite the whole document.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use tracing::debug;

use super::{qualified_name, ParameterStore};
use crate::config::{keys, EnvSnapshot};
use crate::errors::{Result, TaplineError};
use crate::fs::FileSystem;

/// Default location relative to the working directory.
pub const DEFAULT_STORE_PATH: &str = ".tapline/parameters.json";

type Document = Map<String, Value>;

#[derive(Debug)]
pub struct FileParameterStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    // serializes read-modify-write within one process
    write_lock: Mutex<()>,
}

impl FileParameterStore {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store location: `TAPLINE_PARAMETER_STORE` if set, else
    /// [`DEFAULT_STORE_PATH`] under `work_dir`.
    pub fn location(env: &EnvSnapshot, work_dir: &Path) -> PathBuf {
        match env.get_non_empty(keys::PARAMETER_STORE) {
            Some(p) => work_dir.join(p),
            None => work_dir.join(DEFAULT_STORE_PATH),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Document> {
        if !self.fs.exists(&self.path) {
            return Ok(Document::new());
        }
        let contents = self.fs.read_to_string(&self.path)?;
        match serde_json::from_str::<Value>(&contents)? {
            Value::Object(doc) => Ok(doc),
            _ => Err(TaplineError::StoreError(format!(
                "{} is not a JSON object",
                self.path.display()
            ))),
        }
    }

    fn project<'a>(doc: &'a Document, project: &str) -> Option<&'a Map<String, Value>> {
        doc.get(project).and_then(Value::as_object)
    }
}

impl ParameterStore for FileParameterStore {
    fn get(&self, project: &str, key: &str) -> Result<String> {
        let doc = self.load()?;
        let value = Self::project(&doc, project)
            .and_then(|p| p.get(key))
            .ok_or_else(|| {
                TaplineError::StoreError(format!(
                    "parameter {} not found in {}",
                    qualified_name(project, key),
                    self.path.display()
                ))
            })?;

        match value {
            Value::String(s) => Ok(s.clone()),
            other => Ok(other.to_string()),
        }
    }

    fn put(&self, project: &str, key: &str, value: &str) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| TaplineError::StoreError("store lock poisoned".to_string()))?;

        let mut doc = self.load()?;
        let entry = doc
            .entry(project.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(params) = entry else {
            return Err(TaplineError::StoreError(format!(
                "project entry '{project}' in {} is not a JSON object",
                self.path.display()
            )));
        };
        params.insert(key.to_string(), Value::String(value.to_string()));

        let rendered = serde_json::to_string_pretty(&doc)?;
        self.fs.write(&self.path, rendered.as_bytes())?;
        debug!(parameter = %qualified_name(project, key), path = %self.path.display(), "stored parameter");
        Ok(())
    }

    fn list_keys(&self, project: &str) -> Result<Vec<String>> {
        let doc = self.load()?;
        Ok(Self::project(&doc, project)
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default())
    }
}
