// src/errors.rs

//! Crate-wide error type and result alias.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Which side of the pipe a process belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Tap,
    Target,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Tap => f.write_str("tap"),
            Role::Target => f.write_str("target"),
        }
    }
}

#[derive(Error, Debug)]
pub enum TaplineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Missing required value: {0}")]
    MissingValue(String),

    #[error("Template error: unresolved placeholder '{{{key}}}' in \"{template}\"")]
    TemplateMissingKey { key: String, template: String },

    #[error("Template error: {0}")]
    TemplateSyntax(String),

    #[error("Invalid command: {name}\nAvailable commands are {available:?}")]
    UnknownCommand {
        name: String,
        available: Vec<&'static str>,
    },

    #[error("failed to start {role} process: {source}")]
    Spawn {
        role: Role,
        #[source]
        source: std::io::Error,
    },

    /// `signal` is set when the process was killed by a signal; `code` is
    /// then -1.
    #[error("target exited with {}; output: {output}", describe_exit(.code, .signal))]
    TargetFailed {
        code: i32,
        signal: Option<i32>,
        output: String,
    },

    #[error("tap exited with {}", describe_exit(.code, .signal))]
    TapFailed { code: i32, signal: Option<i32> },

    #[error("pipeline timed out after {0:?}")]
    Timeout(Duration),

    #[error("pipeline cancelled")]
    Cancelled,

    #[error("Parameter store error: {0}")]
    StoreError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn describe_exit(code: &i32, signal: &Option<i32>) -> String {
    match signal {
        Some(sig) => format!("signal {sig}"),
        None => format!("status {code}"),
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TaplineError>;
