// src/config/model.rs

use std::collections::BTreeMap;

use serde_json::Value;

use crate::config::env::EnvSnapshot;
use crate::errors::Result;

/// Environment keys the harness understands.
pub mod keys {
    pub const TAP_COMMAND: &str = "tap_command";
    pub const TAP_ARGS: &str = "tap_args";
    pub const TARGET_COMMAND: &str = "target_command";
    pub const TARGET_ARGS: &str = "target_args";
    pub const TAP_CONFIG: &str = "tap_config";
    pub const TARGET_CONFIG: &str = "target_config";
    pub const CATALOG: &str = "catalog";
    pub const GOOGLE_CLIENT_SECRET: &str = "google_client_secret";
    pub const GOOGLE_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
    pub const STACK_NAME: &str = "STACK_NAME";
    pub const PATH: &str = "PATH";
    pub const PYTHONPATH: &str = "PYTHONPATH";
    pub const PYTHON: &str = "PYTHON";
    pub const CODE_DIR: &str = "CODE_DIR";
    pub const PARAMETER_STORE: &str = "TAPLINE_PARAMETER_STORE";
}

/// Template and argument string for one side of the pipe.
///
/// ```text
/// tap_command = "{python} -m tap_rest"
/// tap_args    = "--config {work_dir}/.env/tap_config.json"
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub template: String,
    /// `None` when the `*_args` key is absent.
    pub args: Option<String>,
}

impl CommandSpec {
    pub fn new(template: impl Into<String>, args: Option<impl Into<String>>) -> Self {
        Self {
            template: template.into(),
            args: args.map(Into::into),
        }
    }

    fn from_env(env: &EnvSnapshot, command_key: &str, args_key: &str) -> Result<Self> {
        Ok(Self {
            template: env.require(command_key)?.to_string(),
            args: env.get(args_key).map(str::to_string),
        })
    }
}

/// Tap and target command templates, read once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSpec {
    pub tap: CommandSpec,
    pub target: CommandSpec,
}

impl PipelineSpec {
    pub fn from_env(env: &EnvSnapshot) -> Result<Self> {
        Ok(Self {
            tap: CommandSpec::from_env(env, keys::TAP_COMMAND, keys::TAP_ARGS)?,
            target: CommandSpec::from_env(env, keys::TARGET_COMMAND, keys::TARGET_ARGS)?,
        })
    }
}

/// Fully resolved shell strings, tap first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineCommands {
    pub tap: String,
    pub target: String,
}

/// Flatten a JSON object into string entries.
///
/// Strings are kept verbatim, `null` is dropped, everything else becomes its
/// compact JSON text.
pub fn flatten_json_object(object: &serde_json::Map<String, Value>) -> BTreeMap<String, String> {
    object
        .iter()
        .filter_map(|(k, v)| json_to_string(v).map(|s| (k.clone(), s)))
        .collect()
}

pub fn json_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TaplineError;
    use serde_json::json;

    #[test]
    fn pipeline_spec_requires_commands_but_not_args() {
        let env = EnvSnapshot::from_pairs([("tap_command", "cat"), ("target_command", "wc")]);
        let spec = PipelineSpec::from_env(&env).unwrap();
        assert_eq!(spec.tap, CommandSpec::new("cat", None::<String>));
        assert_eq!(spec.target.args, None);

        let env = EnvSnapshot::from_pairs([("tap_command", "cat")]);
        let err = PipelineSpec::from_env(&env).unwrap_err();
        assert!(matches!(err, TaplineError::MissingValue(ref m) if m.contains("target_command")));
    }

    #[test]
    fn flatten_keeps_strings_and_serializes_the_rest() {
        let value = json!({
            "tap_command": "cat",
            "retries": 3,
            "enabled": true,
            "skip": null,
            "tap_config": {"url": "https://example.com"}
        });
        let flat = flatten_json_object(value.as_object().unwrap());

        assert_eq!(flat["tap_command"], "cat");
        assert_eq!(flat["retries"], "3");
        assert_eq!(flat["enabled"], "true");
        assert!(!flat.contains_key("skip"));
        assert_eq!(flat["tap_config"], r#"{"url":"https://example.com"}"#);
    }
}
