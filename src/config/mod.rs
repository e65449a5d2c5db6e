// src/config/mod.rs

//! Configuration inputs for a run.
//!
//! Responsibilities:
//! - Hold the immutable environment snapshot (`env.rs`).
//! - Define command templates and well-known keys (`model.rs`).
//! - Load `--data`, parameter files and parameter-store manifests
//!   (`loader.rs`).

pub mod env;
pub mod loader;
pub mod model;

pub use env::EnvSnapshot;
pub use loader::{load_from_store, load_parameter_file, parse_data, read_manifest, MANIFEST_FILE};
pub use model::{keys, CommandSpec, PipelineCommands, PipelineSpec};
