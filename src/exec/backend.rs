// src/exec/backend.rs

//! Pluggable pipeline executor.
//!
//! The dispatcher talks to a `PipelineExecutor` instead of spawning
//! processes itself. `RealPipelineExecutor` runs the real tap/target pair;
//! tests can substitute an executor that records jobs and returns canned
//! reports.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::oneshot;

use crate::errors::Result;

use super::pipeline::{run_pipeline, CancelSignal, PipelineJob, PipelineReport};

pub trait PipelineExecutor: Send {
    fn execute(
        &mut self,
        job: PipelineJob,
    ) -> Pin<Box<dyn Future<Output = Result<PipelineReport>> + Send + '_>>;
}

/// Executor used in production.
///
/// Holds the cancel signal wired to Ctrl-C by the binary.
#[derive(Debug, Default)]
pub struct RealPipelineExecutor {
    cancel: CancelSignal,
}

impl RealPipelineExecutor {
    pub fn new(cancel_rx: oneshot::Receiver<()>) -> Self {
        Self {
            cancel: CancelSignal::new(cancel_rx),
        }
    }

    /// Executor that can only be stopped by its job's timeout.
    pub fn uncancellable() -> Self {
        Self::default()
    }
}

impl PipelineExecutor for RealPipelineExecutor {
    fn execute(
        &mut self,
        job: PipelineJob,
    ) -> Pin<Box<dyn Future<Output = Result<PipelineReport>> + Send + '_>> {
        Box::pin(async move { run_pipeline(&job, &mut self.cancel).await })
    }
}
