// src/template.rs

//! Command-string templating.
//!
//! A command is `template + " " + args`, with `{key}` placeholders filled in
//! from the [`ParameterSet`]. `{{` and `}}` stand for literal braces.
//!
//! The result is handed to a shell verbatim. Templates and parameter values
//! are trusted input: nothing is quoted or escaped, because tap and target
//! definitions rely on pipes, redirections and variable expansion.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::config::CommandSpec;
use crate::errors::{Result, TaplineError};
use crate::params::ParameterSet;

/// Parameter that turns on virtualenv wrapping.
pub const VENV_KEY: &str = "venv";

const VENV_PREFIX: &str = "/bin/bash -c \"source {code_dir}/{venv}/bin/activate && ";

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // escaped braces, a placeholder, or a lone brace (always an error)
        Regex::new(r"\{\{|\}\}|\{([^{}]*)\}|[{}]").expect("placeholder regex is valid")
    })
}

/// Expand `{key}` placeholders in `template` against `params`.
pub fn render(template: &str, params: &ParameterSet) -> Result<String> {
    let mut failure: Option<TaplineError> = None;

    let rendered = token_regex().replace_all(template, |caps: &Captures<'_>| {
        if failure.is_some() {
            return String::new();
        }
        match (caps.get(0).map(|m| m.as_str()), caps.get(1)) {
            (Some("{{"), _) => "{".to_string(),
            (Some("}}"), _) => "}".to_string(),
            (_, Some(key)) => match params.get(key.as_str()) {
                Some(value) => value.to_string(),
                None => {
                    failure = Some(TaplineError::TemplateMissingKey {
                        key: key.as_str().to_string(),
                        template: template.to_string(),
                    });
                    String::new()
                }
            },
            (lone, None) => {
                failure = Some(TaplineError::TemplateSyntax(format!(
                    "unmatched '{}' in \"{template}\"",
                    lone.unwrap_or_default()
                )));
                String::new()
            }
        }
    });

    match failure {
        Some(err) => Err(err),
        None => Ok(rendered.into_owned()),
    }
}

/// Build the shell command for one side of the pipe.
///
/// When `venv` is set to a non-empty value the command runs inside a bash
/// that first sources `{code_dir}/{venv}/bin/activate`.
pub fn build_command(template: &str, args: Option<&str>, params: &ParameterSet) -> Result<String> {
    let joined = match args {
        Some(args) => format!("{template} {args}"),
        None => template.to_string(),
    };
    let command = render(&joined, params)?;

    if params.get(VENV_KEY).is_some_and(|v| !v.is_empty()) {
        let prefix = render(VENV_PREFIX, params)?;
        return Ok(format!("{prefix}{command}\""));
    }

    Ok(command)
}

/// Convenience wrapper over [`build_command`] for a [`CommandSpec`].
pub fn build_from_spec(spec: &CommandSpec, params: &ParameterSet) -> Result<String> {
    build_command(&spec.template, spec.args.as_deref(), params)
}
