// src/materialize.rs

//! Writes configuration blobs where the tap and target expect them.
//!
//! | blob                   | path                                     |
//! |------------------------|------------------------------------------|
//! | `tap_config`           | `<work_dir>/.env/tap_config.json`        |
//! | `target_config`        | `<work_dir>/.env/target_config.json`     |
//! | `google_client_secret` | `GOOGLE_APPLICATION_CREDENTIALS` or `<work_dir>/.env/client_secret.json` |
//! | `catalog` (optional)   | `<work_dir>/catalog.json`                |
//!
//! Files are overwritten on every run and never removed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{keys, EnvSnapshot};
use crate::errors::{Result, TaplineError};
use crate::fs::FileSystem;

pub const ENV_DIR: &str = ".env";
pub const TAP_CONFIG_FILE: &str = "tap_config.json";
pub const TARGET_CONFIG_FILE: &str = "target_config.json";
pub const CLIENT_SECRET_FILE: &str = "client_secret.json";
pub const CATALOG_FILE: &str = "catalog.json";

/// How to treat a missing blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeMode {
    /// Missing blob is an error. Used for real runs.
    Strict,
    /// Missing blob is skipped with a warning. Used for dry runs.
    Lenient,
}

/// What `write_config` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedConfig {
    /// Credentials path children should see as
    /// `GOOGLE_APPLICATION_CREDENTIALS`. `None` only when the secret was
    /// skipped in lenient mode and no path was configured.
    pub credentials_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ConfigMaterializer {
    fs: Arc<dyn FileSystem>,
    work_dir: PathBuf,
}

impl ConfigMaterializer {
    pub fn new(fs: Arc<dyn FileSystem>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            work_dir: work_dir.into(),
        }
    }

    pub fn env_dir(&self) -> PathBuf {
        self.work_dir.join(ENV_DIR)
    }

    /// Credentials path: the configured one (relative paths resolved against
    /// the working directory), else `.env/client_secret.json`.
    pub fn credentials_path(&self, env: &EnvSnapshot) -> PathBuf {
        match env.get_non_empty(keys::GOOGLE_CREDENTIALS) {
            Some(configured) => self.work_dir.join(configured),
            None => self.env_dir().join(CLIENT_SECRET_FILE),
        }
    }

    /// Write tap config, target config and the credentials file.
    pub fn write_config(&self, env: &EnvSnapshot, mode: MaterializeMode) -> Result<MaterializedConfig> {
        let env_dir = self.env_dir();
        self.fs.create_dir_all(&env_dir)?;

        self.write_blob(env, keys::TAP_CONFIG, &env_dir.join(TAP_CONFIG_FILE), mode)?;
        self.write_blob(env, keys::TARGET_CONFIG, &env_dir.join(TARGET_CONFIG_FILE), mode)?;

        let credentials = self.credentials_path(env);
        let wrote_secret =
            self.write_blob(env, keys::GOOGLE_CLIENT_SECRET, &credentials, mode)?;

        let credentials_path = if wrote_secret || env.get_non_empty(keys::GOOGLE_CREDENTIALS).is_some() {
            Some(credentials)
        } else {
            None
        };

        info!(
            work_dir = %self.work_dir.display(),
            credentials = ?credentials_path,
            "configuration written"
        );
        Ok(MaterializedConfig { credentials_path })
    }

    /// Write `catalog.json` if a catalog is configured. Returns the path
    /// written, if any.
    pub fn write_catalog(&self, env: &EnvSnapshot) -> Result<Option<PathBuf>> {
        let Some(catalog) = env.get_non_empty(keys::CATALOG) else {
            debug!("no catalog configured");
            return Ok(None);
        };
        let path = self.work_dir.join(CATALOG_FILE);
        self.fs.write(&path, catalog.as_bytes())?;
        debug!(path = %path.display(), bytes = catalog.len(), "catalog written");
        Ok(Some(path))
    }

    /// Returns whether the blob was written.
    fn write_blob(
        &self,
        env: &EnvSnapshot,
        key: &str,
        path: &Path,
        mode: MaterializeMode,
    ) -> Result<bool> {
        match (env.get(key), mode) {
            (Some(contents), _) => {
                self.fs.write(path, contents.as_bytes())?;
                debug!(key, path = %path.display(), bytes = contents.len(), "wrote config blob");
                Ok(true)
            }
            (None, MaterializeMode::Lenient) => {
                warn!(key, path = %path.display(), "value not set; skipping file");
                Ok(false)
            }
            (None, MaterializeMode::Strict) => Err(TaplineError::MissingValue(format!(
                "`{key}` is not set; cannot write {}",
                path.display()
            ))),
        }
    }
}
