use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tapline::errors::{Result, TaplineError};
use tapline::exec::{PipelineExecutor, PipelineJob, PipelineReport};

/// What the fake should answer with.
#[derive(Debug, Clone)]
pub enum FakeOutcome {
    Succeed { target_output: Vec<u8> },
    TargetFails { code: i32 },
    TapFails { code: i32 },
}

/// A fake executor that:
/// - records every job it was handed
/// - immediately answers with the configured outcome, spawning nothing.
pub struct FakeExecutor {
    outcome: FakeOutcome,
    jobs: Arc<Mutex<Vec<PipelineJob>>>,
}

impl FakeExecutor {
    pub fn new(outcome: FakeOutcome, jobs: Arc<Mutex<Vec<PipelineJob>>>) -> Self {
        Self { outcome, jobs }
    }

    pub fn succeeding(jobs: Arc<Mutex<Vec<PipelineJob>>>) -> Self {
        Self::new(
            FakeOutcome::Succeed {
                target_output: Vec::new(),
            },
            jobs,
        )
    }
}

impl PipelineExecutor for FakeExecutor {
    fn execute(
        &mut self,
        job: PipelineJob,
    ) -> Pin<Box<dyn Future<Output = Result<PipelineReport>> + Send + '_>> {
        let outcome = self.outcome.clone();
        let jobs = Arc::clone(&self.jobs);

        Box::pin(async move {
            {
                let mut guard = jobs.lock().unwrap();
                guard.push(job);
            }

            match outcome {
                FakeOutcome::Succeed { target_output } => Ok(PipelineReport {
                    target_output,
                    tap_exit_code: 0,
                    target_exit_code: 0,
                    elapsed: Duration::ZERO,
                }),
                FakeOutcome::TargetFails { code } => Err(TaplineError::TargetFailed {
                    code,
                    signal: None,
                    output: String::new(),
                }),
                FakeOutcome::TapFails { code } => Err(TaplineError::TapFailed { code, signal: None }),
            }
        })
    }
}
