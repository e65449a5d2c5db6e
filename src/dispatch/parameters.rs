// src/dispatch/parameters.rs

//! `put_ssm_parameters` / `dump_ssm_parameters`.
//!
//! Both talk straight to the parameter store and skip the generic parameter
//! loading that other commands go through.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::config::loader::load_parameter_object;
use crate::config::model::json_to_string;
use crate::config::read_manifest;
use crate::errors::{Result, TaplineError};
use crate::fs::FileSystem;
use crate::store::{qualified_name, ParameterStore};

pub const PUT_PARAMETERS: &str = "put_ssm_parameters";
pub const DUMP_PARAMETERS: &str = "dump_ssm_parameters";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreCommand {
    Put,
    Dump,
}

impl StoreCommand {
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            PUT_PARAMETERS => Some(StoreCommand::Put),
            DUMP_PARAMETERS => Some(StoreCommand::Dump),
            _ => None,
        }
    }
}

/// Upload every top-level key of a JSON file. Returns how many were stored.
pub fn put_parameters(
    fs: &dyn FileSystem,
    store: &dyn ParameterStore,
    project: &str,
    param_file: &Path,
) -> Result<usize> {
    if !fs.is_file(param_file) {
        return Err(TaplineError::ConfigError(
            "You need to provide a parameter JSON file.".to_string(),
        ));
    }

    let mut stored = 0;
    for (key, value) in load_parameter_object(fs, param_file)? {
        let Some(value) = json_to_string(&value) else {
            warn!(parameter = %qualified_name(project, &key), "null value; not stored");
            continue;
        };
        store.put(project, &key, &value)?;
        info!(parameter = %qualified_name(project, &key), "parameter stored");
        stored += 1;
    }
    Ok(stored)
}

/// Read every parameter named in `param_file` and render them as indented
/// JSON, in manifest order.
///
/// With `ignore_errors` a failed lookup is logged and the dump stops early
/// returning `None`; otherwise the error propagates.
pub fn dump_parameters(
    fs: &dyn FileSystem,
    store: &dyn ParameterStore,
    project: &str,
    param_file: &Path,
    ignore_errors: bool,
) -> Result<Option<String>> {
    if !fs.is_file(param_file) {
        return Err(TaplineError::ConfigError(
            "You need to provide a parameter file.".to_string(),
        ));
    }

    let mut params = Map::new();
    for key in read_manifest(fs, param_file)?.unwrap_or_default() {
        match store.get(project, &key) {
            Ok(value) => {
                params.insert(key, Value::String(value));
            }
            Err(e) if ignore_errors => {
                error!(
                    error = %e,
                    parameter = %qualified_name(project, &key),
                    "lookup failed; stopping dump"
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(Some(serde_json::to_string_pretty(&Value::Object(params))?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::store::MemoryParameterStore;

    #[test]
    fn lookup_only_matches_store_commands() {
        assert_eq!(StoreCommand::lookup("put_ssm_parameters"), Some(StoreCommand::Put));
        assert_eq!(StoreCommand::lookup("dump_ssm_parameters"), Some(StoreCommand::Dump));
        assert_eq!(StoreCommand::lookup("run_etl"), None);
    }

    #[test]
    fn put_requires_an_existing_file() {
        let fs = MockFileSystem::new();
        let store = MemoryParameterStore::new();
        let err = put_parameters(&fs, &store, "stack", Path::new("/w/params.json")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: You need to provide a parameter JSON file."
        );
    }

    #[test]
    fn put_stores_every_non_null_key() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "/w/params.json",
            r#"{"tap_command": "cat", "tap_config": {"a": 1}, "unused": null}"#,
        );
        let store = MemoryParameterStore::new();

        let stored = put_parameters(&fs, &store, "stack", Path::new("/w/params.json")).unwrap();

        assert_eq!(stored, 2);
        assert_eq!(store.get("stack", "tap_command").unwrap(), "cat");
        assert_eq!(store.get("stack", "tap_config").unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn dump_renders_in_manifest_order() {
        let fs = MockFileSystem::new();
        fs.add_file("/w/names.txt", "zeta\nalpha\n");
        let store = MemoryParameterStore::new()
            .with_value("stack", "zeta", "z")
            .with_value("stack", "alpha", "a");

        let out = dump_parameters(&fs, &store, "stack", Path::new("/w/names.txt"), false)
            .unwrap()
            .unwrap();

        assert_eq!(out, "{\n  \"zeta\": \"z\",\n  \"alpha\": \"a\"\n}");
    }

    #[test]
    fn dump_propagates_lookup_errors_by_default() {
        let fs = MockFileSystem::new();
        fs.add_file("/w/names.txt", "missing\n");
        let store = MemoryParameterStore::new();

        let err = dump_parameters(&fs, &store, "stack", Path::new("/w/names.txt"), false)
            .unwrap_err();
        assert!(matches!(err, TaplineError::StoreError(_)));
    }

    #[test]
    fn dump_can_opt_into_swallowing_errors() {
        let fs = MockFileSystem::new();
        fs.add_file("/w/names.txt", "present\nmissing\n");
        let store = MemoryParameterStore::new().with_value("stack", "present", "p");

        let out = dump_parameters(&fs, &store, "stack", Path::new("/w/names.txt"), true).unwrap();
        assert_eq!(out, None);
    }
}
