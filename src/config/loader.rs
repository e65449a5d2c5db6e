// src/config/loader.rs

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::model::flatten_json_object;
use crate::errors::{Result, TaplineError};
use crate::fs::FileSystem;
use crate::store::ParameterStore;

/// Name of the manifest listing parameter-store keys to load.
pub const MANIFEST_FILE: &str = "ssm_params.txt";

/// Parse the `--data` argument into a JSON object.
///
/// A string that fails to parse is retried once with its last character
/// removed, which tolerates a stray trailing quote left by some shell
/// wrappers. Anything else is a configuration error.
pub fn parse_data(raw: &str) -> Result<Map<String, Value>> {
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(v) => v,
        Err(first) => {
            let truncated = match raw.char_indices().last() {
                Some((idx, _)) => &raw[..idx],
                None => raw,
            };
            let v = serde_json::from_str::<Value>(truncated).map_err(|_| {
                TaplineError::ConfigError(format!("invalid --data JSON: {first}"))
            })?;
            warn!(data = %raw, "--data parsed only after dropping its last character");
            v
        }
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(TaplineError::ConfigError(format!(
            "--data must be a JSON object, got {other}"
        ))),
    }
}

fn read_json_object(fs: &dyn FileSystem, path: &Path) -> Result<Map<String, Value>> {
    let contents = fs.read_to_string(path)?;
    match serde_json::from_str::<Value>(&contents)? {
        Value::Object(map) => Ok(map),
        _ => Err(TaplineError::ConfigError(format!(
            "{} must contain a JSON object",
            path.display()
        ))),
    }
}

/// Load a JSON parameter file; each top-level key becomes one entry.
pub fn load_parameter_file(
    fs: &dyn FileSystem,
    path: &Path,
) -> Result<BTreeMap<String, String>> {
    if !fs.is_file(path) {
        return Err(TaplineError::ConfigError(format!(
            "{} not found.",
            path.display()
        )));
    }
    let object = read_json_object(fs, path)?;
    Ok(flatten_json_object(&object))
}

/// Load a JSON parameter file keeping the original key order.
pub fn load_parameter_object(fs: &dyn FileSystem, path: &Path) -> Result<Map<String, Value>> {
    read_json_object(fs, path)
}

/// Read a newline-delimited list of parameter names. Blank lines are
/// ignored. Returns `None` if the file does not exist.
pub fn read_manifest(fs: &dyn FileSystem, path: &Path) -> Result<Option<Vec<String>>> {
    if !fs.is_file(path) {
        return Ok(None);
    }
    let contents = fs.read_to_string(path)?;
    Ok(Some(
        contents
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
    ))
}

/// Fetch every name listed in the manifest at `manifest` from the parameter
/// store. A missing manifest yields an empty map.
pub fn load_from_store(
    fs: &dyn FileSystem,
    store: &dyn ParameterStore,
    project: &str,
    manifest: &Path,
) -> Result<BTreeMap<String, String>> {
    let Some(names) = read_manifest(fs, manifest)? else {
        debug!(manifest = %manifest.display(), "no parameter manifest; skipping store lookup");
        return Ok(BTreeMap::new());
    };

    let mut values = BTreeMap::new();
    for name in names {
        let value = store.get(project, &name)?;
        debug!(project, parameter = %name, "loaded parameter from store");
        values.insert(name, value);
    }
    Ok(values)
}
