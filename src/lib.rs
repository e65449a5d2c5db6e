// src/lib.rs

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod materialize;
pub mod params;
pub mod store;
pub mod template;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{parse_data, EnvSnapshot};
use crate::dispatch::Dispatcher;
use crate::exec::RealPipelineExecutor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::store::FileParameterStore;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - `--data` parsing and the environment snapshot
/// - the file-backed parameter store
/// - the pipeline executor, cancellable with Ctrl-C
/// - the dispatcher, whose stdout text is printed on success
pub async fn run(args: CliArgs) -> Result<()> {
    let data = parse_data(&args.data)?;
    let env = EnvSnapshot::from_process();
    let work_dir = std::env::current_dir().context("cannot determine working directory")?;

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let store_path = FileParameterStore::location(&env, &work_dir);
    info!(work_dir = %work_dir.display(), store = %store_path.display(), "tapline run");
    let store = Arc::new(FileParameterStore::new(Arc::clone(&fs), store_path));

    // Ctrl-C → kill the running pipeline.
    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            return;
        }
        let _ = cancel_tx.send(());
    });
    let executor = RealPipelineExecutor::new(cancel_rx);

    let mut dispatcher = Dispatcher::new(fs, store, Box::new(executor), env, work_dir)
        .with_timeout(args.timeout.map(Duration::from_secs));

    let output = dispatcher
        .dispatch(&args.command, &data, args.parameter_file.as_deref())
        .await?;

    if let Some(text) = output.stdout_text() {
        println!("{text}");
    }
    Ok(())
}
