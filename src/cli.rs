// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `tapline`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tapline",
    version,
    about = "Configure and run a tap process piped into a target process.",
    long_about = None
)]
pub struct CliArgs {
    /// Command to run: run_etl, show_commands, default, put_ssm_parameters
    /// or dump_ssm_parameters.
    pub command: String,

    /// Data required for the command as a JSON object.
    #[arg(short = 'd', long, value_name = "JSON", default_value = "{}")]
    pub data: String,

    /// Read parameters from this JSON file instead of the parameter store.
    #[arg(
        short = 'p',
        long = "parameter_file",
        visible_alias = "parameter-file",
        value_name = "PATH"
    )]
    pub parameter_file: Option<PathBuf>,

    /// Kill the tap and target if the pipeline runs longer than this many
    /// seconds.
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TAPLINE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
