// src/params/mod.rs

//! Parameter resolution.
//!
//! A [`ParameterSet`] is built in three layers, later layers winning:
//!
//! 1. [`RuntimeInfo`] (`module`, `executable`, `python`, `code_dir`,
//!    `work_dir`, `search_path`)
//! 2. the environment snapshot
//! 3. caller overrides (`--data` plus the computed time window)

pub mod window;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{keys, EnvSnapshot};

pub use window::TimeWindow;

/// Flat string-to-string parameter map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    values: BTreeMap<String, String>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut set = Self::new();
        set.extend(pairs);
        set
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn extend<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in pairs {
            self.insert(k, v);
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Facts about the running harness, exposed to command templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub module: String,
    pub executable: PathBuf,
    /// Interpreter that templates refer to as `{python}`.
    pub python: String,
    pub code_dir: PathBuf,
    pub work_dir: PathBuf,
    /// `code_dir` followed by any `PYTHONPATH` entries, joined with the
    /// platform separator. Exported to children as `PYTHONPATH`.
    pub search_path: String,
}

impl RuntimeInfo {
    /// Detect runtime info. Never fails: anything that cannot be determined
    /// falls back to something usable.
    pub fn detect(env: &EnvSnapshot, work_dir: &Path) -> Self {
        let executable = std::env::current_exe().unwrap_or_default();
        let code_dir = match env.get_non_empty(keys::CODE_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => executable
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| work_dir.to_path_buf()),
        };
        let python = env
            .get_non_empty(keys::PYTHON)
            .unwrap_or("python3")
            .to_string();

        let search_path = search_path(&code_dir, env.get(keys::PYTHONPATH));

        Self {
            module: env!("CARGO_PKG_NAME").to_string(),
            executable,
            python,
            code_dir,
            work_dir: work_dir.to_path_buf(),
            search_path,
        }
    }

    fn to_pairs(&self) -> [(&'static str, String); 6] {
        [
            ("module", self.module.clone()),
            ("executable", self.executable.display().to_string()),
            ("python", self.python.clone()),
            ("code_dir", self.code_dir.display().to_string()),
            ("work_dir", self.work_dir.display().to_string()),
            ("search_path", self.search_path.clone()),
        ]
    }
}

fn search_path(code_dir: &Path, existing: Option<&str>) -> String {
    let mut entries = vec![code_dir.to_path_buf()];
    if let Some(existing) = existing {
        entries.extend(std::env::split_paths(existing).filter(|p| !p.as_os_str().is_empty()));
    }
    match std::env::join_paths(&entries) {
        Ok(joined) => joined.to_string_lossy().into_owned(),
        // an entry contained the separator itself; keep just the code dir
        Err(_) => code_dir.display().to_string(),
    }
}

/// Layers runtime info, environment and overrides into a [`ParameterSet`].
#[derive(Debug, Clone)]
pub struct ParameterResolver {
    runtime: RuntimeInfo,
}

impl ParameterResolver {
    pub fn new(runtime: RuntimeInfo) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &RuntimeInfo {
        &self.runtime
    }

    pub fn resolve(&self, env: &EnvSnapshot, overrides: &ParameterSet) -> ParameterSet {
        let mut params = ParameterSet::from_pairs(self.runtime.to_pairs());
        params.extend(env.iter());
        params.extend(overrides.iter());
        debug!(
            runtime_keys = 6,
            env_keys = env.len(),
            override_keys = overrides.len(),
            "resolved parameter set"
        );
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> RuntimeInfo {
        RuntimeInfo {
            module: "tapline".into(),
            executable: PathBuf::from("/opt/tapline/bin/tapline"),
            python: "python3".into(),
            code_dir: PathBuf::from("/opt/tapline/bin"),
            work_dir: PathBuf::from("/w"),
            search_path: "/opt/tapline/bin".into(),
        }
    }

    #[test]
    fn runtime_keys_are_always_present() {
        let params = ParameterResolver::new(runtime())
            .resolve(&EnvSnapshot::default(), &ParameterSet::default());

        for key in ["module", "executable", "python", "code_dir", "work_dir", "search_path"] {
            assert!(params.contains_key(key), "missing {key}");
        }
        assert_eq!(params.get("work_dir"), Some("/w"));
    }

    #[test]
    fn later_layers_win() {
        let env = EnvSnapshot::from_pairs([("python", "/env/python"), ("venv", "envvenv")]);
        let overrides = ParameterSet::from_pairs([("venv", "myenv")]);

        let params = ParameterResolver::new(runtime()).resolve(&env, &overrides);

        assert_eq!(params.get("python"), Some("/env/python"));
        assert_eq!(params.get("venv"), Some("myenv"));
        assert_eq!(params.get("module"), Some("tapline"));
    }

    #[test]
    fn detect_uses_env_overrides() {
        let env = EnvSnapshot::from_pairs([
            ("CODE_DIR", "/app"),
            ("PYTHON", "/usr/local/bin/python3.12"),
        ]);
        let info = RuntimeInfo::detect(&env, Path::new("/w"));

        assert_eq!(info.code_dir, PathBuf::from("/app"));
        assert_eq!(info.python, "/usr/local/bin/python3.12");
        assert_eq!(info.work_dir, PathBuf::from("/w"));
        assert!(info.search_path.starts_with("/app"));
    }

    #[cfg(unix)]
    #[test]
    fn search_path_appends_existing_entries() {
        let joined = search_path(Path::new("/app"), Some("/lib/a:/lib/b"));
        assert_eq!(joined, "/app:/lib/a:/lib/b");

        let joined = search_path(Path::new("/app"), None);
        assert_eq!(joined, "/app");
    }
}
