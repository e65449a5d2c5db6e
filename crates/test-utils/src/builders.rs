#![allow(dead_code)]

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tapline::config::{keys, EnvSnapshot};

/// Builder for `EnvSnapshot` to simplify test setup.
///
/// Starts empty: nothing leaks in from the test process environment.
#[derive(Debug, Default)]
pub struct EnvBuilder {
    vars: BTreeMap<String, String>,
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn tap(self, command: &str) -> Self {
        self.var(keys::TAP_COMMAND, command)
    }

    pub fn tap_args(self, args: &str) -> Self {
        self.var(keys::TAP_ARGS, args)
    }

    pub fn target(self, command: &str) -> Self {
        self.var(keys::TARGET_COMMAND, command)
    }

    pub fn target_args(self, args: &str) -> Self {
        self.var(keys::TARGET_ARGS, args)
    }

    pub fn stack(self, name: &str) -> Self {
        self.var(keys::STACK_NAME, name)
    }

    /// Copy `PATH` from the test process so spawned shells find `cat` etc.
    pub fn inherit_path(self) -> Self {
        match std::env::var(keys::PATH) {
            Ok(path) => self.var(keys::PATH, &path),
            Err(_) => self,
        }
    }

    pub fn build(self) -> EnvSnapshot {
        EnvSnapshot::from_pairs(self.vars)
    }
}

/// Builder for the JSON object passed as `--data` or written as a
/// parameter file.
#[derive(Debug, Default)]
pub struct DataBuilder {
    object: Map<String, Value>,
}

impl DataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn str(mut self, key: &str, value: &str) -> Self {
        self.object.insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    pub fn value(mut self, key: &str, value: Value) -> Self {
        self.object.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> Map<String, Value> {
        self.object
    }

    pub fn to_json(&self) -> String {
        Value::Object(self.object.clone()).to_string()
    }
}
