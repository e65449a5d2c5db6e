#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;

use tapline::fs::{FileSystem, RealFileSystem};
use tapline::params::RuntimeInfo;

/// A scratch working directory on the real filesystem.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.join(rel);
        std::fs::write(&path, contents).expect("write workspace file");
        path
    }

    pub fn write_json(&self, rel: &str, value: &Value) -> PathBuf {
        self.write(rel, &serde_json::to_string_pretty(value).expect("serialize json"))
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.join(rel)).expect("read workspace file")
    }

    pub fn fs(&self) -> Arc<dyn FileSystem> {
        Arc::new(RealFileSystem)
    }

    /// Runtime info with fixed interpreter and code dir, rooted here.
    pub fn runtime(&self) -> RuntimeInfo {
        RuntimeInfo {
            module: "tapline".into(),
            executable: PathBuf::from("/opt/tapline/bin/tapline"),
            python: "python3".into(),
            code_dir: PathBuf::from("/opt/tapline"),
            work_dir: self.path().to_path_buf(),
            search_path: "/opt/tapline".into(),
        }
    }
}
