// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`process`] builds shell commands and the child environment.
//! - [`pipeline`] spawns the tap and target, wires the pipe between them and
//!   supervises both until they exit, time out or are cancelled.
//! - [`backend`] provides the `PipelineExecutor` trait and the
//!   `RealPipelineExecutor` used in production, which tests can replace
//!   with a fake.

pub mod backend;
pub mod pipeline;
pub mod process;

pub use backend::{PipelineExecutor, RealPipelineExecutor};
pub use pipeline::{run_pipeline, CancelSignal, PipelineJob, PipelineReport};
pub use process::{shell_command, ProcessEnv};
