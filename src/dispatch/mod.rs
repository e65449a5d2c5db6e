// src/dispatch/mod.rs

//! Command dispatch.
//!
//! `put_ssm_parameters` and `dump_ssm_parameters` go straight to the
//! parameter store. Every other name is looked up in the static
//! [`Operation`] registry; before the operation runs, parameters are loaded
//! from `--parameter_file` or, failing that, from the parameter store via
//! `ssm_params.txt`.

pub mod etl;
pub mod parameters;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::{keys, load_from_store, load_parameter_file, EnvSnapshot, PipelineCommands, MANIFEST_FILE};
use crate::errors::{Result, TaplineError};
use crate::exec::{PipelineExecutor, PipelineReport};
use crate::fs::FileSystem;
use crate::params::RuntimeInfo;
use crate::store::ParameterStore;

use self::etl::EtlContext;
use self::parameters::StoreCommand;

/// Operations reachable through the generic dispatch path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    RunEtl,
    ShowCommands,
    /// Alias for `run_etl`.
    Default,
}

impl Operation {
    pub const ALL: [Operation; 3] = [
        Operation::RunEtl,
        Operation::ShowCommands,
        Operation::Default,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::RunEtl => "run_etl",
            Operation::ShowCommands => "show_commands",
            Operation::Default => "default",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|op| op.name()).collect()
    }

    pub fn lookup(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == name)
            .ok_or_else(|| TaplineError::UnknownCommand {
                name: name.to_string(),
                available: Self::names(),
            })
    }
}

/// Result of a dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutput {
    Nothing,
    Commands(PipelineCommands),
    Pipeline(PipelineReport),
    Dump(String),
}

impl DispatchOutput {
    /// Text meant for stdout, if any.
    pub fn stdout_text(&self) -> Option<String> {
        match self {
            DispatchOutput::Commands(c) => Some(format!("{}\n{}", c.tap, c.target)),
            DispatchOutput::Dump(s) => Some(s.clone()),
            DispatchOutput::Nothing | DispatchOutput::Pipeline(_) => None,
        }
    }
}

pub struct Dispatcher {
    fs: Arc<dyn FileSystem>,
    store: Arc<dyn ParameterStore>,
    executor: Box<dyn PipelineExecutor>,
    env: EnvSnapshot,
    work_dir: PathBuf,
    runtime: RuntimeInfo,
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        store: Arc<dyn ParameterStore>,
        executor: Box<dyn PipelineExecutor>,
        env: EnvSnapshot,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        let work_dir = work_dir.into();
        let runtime = RuntimeInfo::detect(&env, &work_dir);
        Self {
            fs,
            store,
            executor,
            env,
            work_dir,
            runtime,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_runtime(mut self, runtime: RuntimeInfo) -> Self {
        self.runtime = runtime;
        self
    }

    /// Environment as seen by operations (after any parameter loading).
    pub fn env(&self) -> &EnvSnapshot {
        &self.env
    }

    pub async fn dispatch(
        &mut self,
        command: &str,
        data: &Map<String, Value>,
        parameter_file: Option<&Path>,
    ) -> Result<DispatchOutput> {
        if let Some(store_command) = StoreCommand::lookup(command) {
            return self.run_store_command(store_command, data);
        }

        let operation = Operation::lookup(command)?;
        info!("Running {}", operation.name());

        self.load_parameters(parameter_file)?;

        let started = Utc::now();
        info!("Job started at {}", started);

        let output = self.invoke(operation, data).await?;

        let ended = Utc::now();
        info!("Job ended at {}", ended);
        let elapsed = (ended - started).to_std().unwrap_or_default();
        info!(elapsed_ms = elapsed.as_millis() as u64, "Processed in {:?}", elapsed);

        Ok(output)
    }

    async fn invoke(&mut self, operation: Operation, data: &Map<String, Value>) -> Result<DispatchOutput> {
        let ctx = EtlContext {
            fs: Arc::clone(&self.fs),
            env: &self.env,
            work_dir: &self.work_dir,
            runtime: &self.runtime,
            timeout: self.timeout,
            now: Utc::now(),
        };

        match operation {
            Operation::RunEtl | Operation::Default => {
                etl::run_etl(&ctx, self.executor.as_mut(), data)
                    .await
                    .map(DispatchOutput::Pipeline)
            }
            Operation::ShowCommands => etl::show_commands(&ctx, data).map(DispatchOutput::Commands),
        }
    }

    fn load_parameters(&mut self, parameter_file: Option<&Path>) -> Result<()> {
        let loaded = match parameter_file {
            Some(path) => {
                let path = self.work_dir.join(path);
                info!("Reading parameters from file: {}", path.display());
                load_parameter_file(self.fs.as_ref(), &path)?
            }
            None => {
                let manifest = self.work_dir.join(MANIFEST_FILE);
                if !self.fs.is_file(&manifest) {
                    debug!(manifest = %manifest.display(), "no manifest; parameters come from the environment only");
                    return Ok(());
                }
                info!("Reading parameters from the parameter store.");
                let project = self.project()?;
                load_from_store(self.fs.as_ref(), self.store.as_ref(), &project, &manifest)?
            }
        };

        debug!(count = loaded.len(), "parameters loaded");
        self.env = self.env.with_overlay(loaded);
        Ok(())
    }

    fn run_store_command(&self, command: StoreCommand, data: &Map<String, Value>) -> Result<DispatchOutput> {
        let param_file = data
            .get("param_file")
            .and_then(Value::as_str)
            .map(|p| self.work_dir.join(p))
            .ok_or_else(|| {
                TaplineError::ConfigError("`param_file` is required in --data".to_string())
            })?;
        let project = self.project()?;

        match command {
            StoreCommand::Put => {
                let stored = parameters::put_parameters(
                    self.fs.as_ref(),
                    self.store.as_ref(),
                    &project,
                    &param_file,
                )?;
                info!(stored, project = %project, "parameters uploaded");
                Ok(DispatchOutput::Nothing)
            }
            StoreCommand::Dump => {
                let ignore_errors = matches!(
                    data.get("ignore_errors"),
                    Some(Value::Bool(true))
                ) || data.get("ignore_errors").and_then(Value::as_str) == Some("true");
                let dumped = parameters::dump_parameters(
                    self.fs.as_ref(),
                    self.store.as_ref(),
                    &project,
                    &param_file,
                    ignore_errors,
                )?;
                Ok(dumped.map_or(DispatchOutput::Nothing, DispatchOutput::Dump))
            }
        }
    }

    fn project(&self) -> Result<String> {
        self.env
            .get_non_empty(keys::STACK_NAME)
            .map(str::to_string)
            .ok_or_else(|| TaplineError::ConfigError(format!("{} is not set", keys::STACK_NAME)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_known_names() {
        assert_eq!(Operation::lookup("run_etl").unwrap(), Operation::RunEtl);
        assert_eq!(Operation::lookup("show_commands").unwrap(), Operation::ShowCommands);
        assert_eq!(Operation::lookup("default").unwrap(), Operation::Default);
    }

    #[test]
    fn unknown_name_lists_all_operations() {
        let err = Operation::lookup("bogus").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Invalid command: bogus"));
        for name in ["run_etl", "show_commands", "default"] {
            assert!(msg.contains(name), "{msg} should mention {name}");
        }
    }

    #[test]
    fn show_output_prints_tap_then_target() {
        let out = DispatchOutput::Commands(PipelineCommands {
            tap: "cat input.txt".into(),
            target: "wc -l".into(),
        });
        assert_eq!(out.stdout_text().unwrap(), "cat input.txt\nwc -l");
        assert_eq!(DispatchOutput::Nothing.stdout_text(), None);
    }
}
