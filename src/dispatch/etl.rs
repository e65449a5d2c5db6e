// src/dispatch/etl.rs

//! The tap → target operations behind `run_etl`, `show_commands` and
//! `default`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::config::model::flatten_json_object;
use crate::config::{EnvSnapshot, PipelineCommands, PipelineSpec};
use crate::errors::Result;
use crate::exec::{PipelineExecutor, PipelineJob, PipelineReport, ProcessEnv};
use crate::fs::FileSystem;
use crate::materialize::{ConfigMaterializer, MaterializeMode};
use crate::params::{ParameterResolver, ParameterSet, RuntimeInfo, TimeWindow};
use crate::template::build_from_spec;

/// Inputs shared by the pipeline operations.
pub struct EtlContext<'a> {
    pub fs: Arc<dyn FileSystem>,
    pub env: &'a EnvSnapshot,
    pub work_dir: &'a Path,
    pub runtime: &'a RuntimeInfo,
    pub timeout: Option<Duration>,
    pub now: DateTime<Utc>,
}

struct Prepared {
    commands: PipelineCommands,
    process_env: ProcessEnv,
}

fn prepare(ctx: &EtlContext<'_>, data: &Map<String, Value>, dry_run: bool) -> Result<Prepared> {
    let materializer = ConfigMaterializer::new(Arc::clone(&ctx.fs), ctx.work_dir);
    let mode = if dry_run {
        MaterializeMode::Lenient
    } else {
        MaterializeMode::Strict
    };
    let materialized = materializer.write_config(ctx.env, mode)?;
    if !dry_run {
        materializer.write_catalog(ctx.env)?;
    }

    let mut overrides = ParameterSet::from_pairs(flatten_json_object(data));
    TimeWindow::from_data(&overrides, ctx.now)?.apply(&mut overrides);

    let params = ParameterResolver::new(ctx.runtime.clone()).resolve(ctx.env, &overrides);
    let spec = PipelineSpec::from_env(ctx.env)?;
    let commands = PipelineCommands {
        tap: build_from_spec(&spec.tap, &params)?,
        target: build_from_spec(&spec.target, &params)?,
    };

    let process_env = ProcessEnv::build(
        ctx.env,
        &ctx.runtime.search_path,
        materialized.credentials_path.as_deref(),
    );

    Ok(Prepared {
        commands,
        process_env,
    })
}

/// Write config, resolve both commands and run the pipeline.
pub async fn run_etl(
    ctx: &EtlContext<'_>,
    executor: &mut dyn PipelineExecutor,
    data: &Map<String, Value>,
) -> Result<PipelineReport> {
    let prepared = prepare(ctx, data, false)?;
    info!(
        tap = %prepared.commands.tap,
        target = %prepared.commands.target,
        "resolved pipeline commands"
    );

    let job = PipelineJob {
        commands: prepared.commands,
        env: prepared.process_env,
        work_dir: ctx.work_dir.to_path_buf(),
        timeout: ctx.timeout,
    };

    executor
        .execute(job)
        .await
        .inspect_err(|e| error!(error = %e, "pipeline failed"))
}

/// Resolve both commands without running anything.
pub fn show_commands(ctx: &EtlContext<'_>, data: &Map<String, Value>) -> Result<PipelineCommands> {
    prepare(ctx, data, true).map(|p| p.commands)
}
