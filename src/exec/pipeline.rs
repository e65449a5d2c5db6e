// src/exec/pipeline.rs

//! Tap → target pipeline supervision.
//!
//! The tap's stdout file descriptor becomes the target's stdin, so bytes
//! flow through an ordinary OS pipe and never pass through this process.
//! Backpressure is the pipe's: a slow target blocks the tap's writes.
//!
//! Sequence:
//! 1. spawn the tap with stdout piped
//! 2. spawn the target reading from that pipe, stdout captured
//! 3. wait for the target; on failure kill the tap and report the target
//! 4. wait for the tap; on failure report the tap
//!
//! Every wait races the optional deadline and the cancel signal.

use std::future::Future;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, ChildStdout};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::PipelineCommands;
use crate::errors::{Result, Role, TaplineError};
use crate::exec::process::{shell_command, ProcessEnv};

/// Everything needed to run one tap/target pair.
#[derive(Debug, Clone)]
pub struct PipelineJob {
    pub commands: PipelineCommands,
    pub env: ProcessEnv,
    pub work_dir: PathBuf,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Everything the target wrote to stdout.
    pub target_output: Vec<u8>,
    pub tap_exit_code: i32,
    pub target_exit_code: i32,
    pub elapsed: Duration,
}

/// Cancellation request delivered over a oneshot channel.
///
/// A dropped sender means "never cancelled", not "cancelled".
#[derive(Debug, Default)]
pub struct CancelSignal {
    rx: Option<oneshot::Receiver<()>>,
    fired: bool,
}

impl CancelSignal {
    pub fn new(rx: oneshot::Receiver<()>) -> Self {
        Self {
            rx: Some(rx),
            fired: false,
        }
    }

    pub fn never() -> Self {
        Self::default()
    }

    /// Resolves once cancellation is requested; pends forever otherwise.
    pub async fn cancelled(&mut self) {
        if self.fired {
            return;
        }
        if let Some(rx) = self.rx.as_mut() {
            let received = rx.await.is_ok();
            self.rx = None;
            if received {
                self.fired = true;
                return;
            }
        }
        std::future::pending::<()>().await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    TimedOut,
    Cancelled,
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

async fn supervise<F: Future>(
    fut: F,
    deadline: Option<Instant>,
    cancel: &mut CancelSignal,
) -> std::result::Result<F::Output, Interrupt> {
    tokio::select! {
        out = fut => Ok(out),
        () = sleep_until(deadline) => Err(Interrupt::TimedOut),
        () = cancel.cancelled() => Err(Interrupt::Cancelled),
    }
}

fn spawn_tap(job: &PipelineJob) -> Result<Child> {
    let mut cmd = shell_command(&job.commands.tap, &job.env, &job.work_dir);
    cmd.stdout(Stdio::piped());
    cmd.spawn().map_err(|source| TaplineError::Spawn {
        role: Role::Tap,
        source,
    })
}

// The command (and with it the harness's copy of the pipe's read end) is
// dropped on return, so the tap sees EPIPE if the target exits early.
fn spawn_target(job: &PipelineJob, input: ChildStdout) -> Result<Child> {
    let stdin: Stdio = input.try_into().map_err(|source| TaplineError::Spawn {
        role: Role::Target,
        source,
    })?;
    let mut cmd = shell_command(&job.commands.target, &job.env, &job.work_dir);
    cmd.stdin(stdin).stdout(Stdio::piped());
    cmd.spawn().map_err(|source| TaplineError::Spawn {
        role: Role::Target,
        source,
    })
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

async fn stop_tap(tap: &mut Child) {
    if let Err(e) = tap.kill().await {
        debug!(error = %e, "tap already gone");
    }
}

async fn interrupted(tap: &mut Child, interrupt: Interrupt, timeout: Option<Duration>) -> TaplineError {
    stop_tap(tap).await;
    match interrupt {
        Interrupt::TimedOut => {
            let limit = timeout.unwrap_or_default();
            error!(timeout = ?limit, "pipeline timed out; processes killed");
            TaplineError::Timeout(limit)
        }
        Interrupt::Cancelled => {
            warn!("pipeline cancelled; processes killed");
            TaplineError::Cancelled
        }
    }
}

/// Run the tap and target connected by a pipe and wait for both.
pub async fn run_pipeline(job: &PipelineJob, cancel: &mut CancelSignal) -> Result<PipelineReport> {
    let started = Instant::now();
    // a deadline too far out to represent is no deadline at all
    let deadline = job.timeout.and_then(|t| started.checked_add(t));

    info!(tap = %job.commands.tap, "starting tap process");
    let mut tap = spawn_tap(job)?;
    let tap_stdout = tap.stdout.take().ok_or_else(|| TaplineError::Spawn {
        role: Role::Tap,
        source: std::io::Error::other("tap stdout was not captured"),
    })?;

    info!(target = %job.commands.target, "starting target process");
    let target = spawn_target(job, tap_stdout)?;

    let waited = supervise(target.wait_with_output(), deadline, cancel).await;
    let output = match waited {
        Ok(output) => output?,
        Err(interrupt) => return Err(interrupted(&mut tap, interrupt, job.timeout).await),
    };

    let target_exit_code = output.status.code().unwrap_or(-1);
    let target_signal = exit_signal(&output.status);
    let target_stdout = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() {
        error!(exit_code = target_exit_code, signal = ?target_signal, "target process failed");
        stop_tap(&mut tap).await;
        return Err(TaplineError::TargetFailed {
            code: target_exit_code,
            signal: target_signal,
            output: target_stdout.into_owned(),
        });
    }
    for line in target_stdout.lines() {
        debug!("target stdout: {}", line);
    }

    let waited = supervise(tap.wait(), deadline, cancel).await;
    let tap_status = match waited {
        Ok(status) => status?,
        Err(interrupt) => return Err(interrupted(&mut tap, interrupt, job.timeout).await),
    };

    let tap_exit_code = tap_status.code().unwrap_or(-1);
    if !tap_status.success() {
        let signal = exit_signal(&tap_status);
        error!(exit_code = tap_exit_code, signal = ?signal, "tap process failed");
        return Err(TaplineError::TapFailed {
            code: tap_exit_code,
            signal,
        });
    }

    let elapsed = started.elapsed();
    info!(
        elapsed_ms = elapsed.as_millis() as u64,
        output_bytes = output.stdout.len(),
        "pipeline finished"
    );

    Ok(PipelineReport {
        target_output: output.stdout,
        tap_exit_code,
        target_exit_code,
        elapsed,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::EnvSnapshot;

    fn job(tap: &str, target: &str, timeout: Option<Duration>) -> PipelineJob {
        let dir = std::env::temp_dir();
        PipelineJob {
            commands: PipelineCommands {
                tap: tap.to_string(),
                target: target.to_string(),
            },
            env: ProcessEnv::build(&EnvSnapshot::from_process(), "", None),
            work_dir: dir,
            timeout,
        }
    }

    #[tokio::test]
    async fn target_output_is_captured() {
        let report = run_pipeline(&job("printf 'a\\nb\\n'", "cat", None), &mut CancelSignal::never())
            .await
            .unwrap();
        assert_eq!(report.target_output, b"a\nb\n");
        assert_eq!(report.tap_exit_code, 0);
        assert_eq!(report.target_exit_code, 0);
    }

    #[tokio::test]
    async fn target_failure_wins_over_tap_failure() {
        let err = run_pipeline(&job("exit 4", "cat >/dev/null; exit 3", None), &mut CancelSignal::never())
            .await
            .unwrap_err();
        assert!(matches!(err, TaplineError::TargetFailed { code: 3, .. }));
    }

    #[tokio::test]
    async fn tap_failure_is_reported_when_target_succeeds() {
        let err = run_pipeline(&job("echo partial; exit 5", "cat >/dev/null", None), &mut CancelSignal::never())
            .await
            .unwrap_err();
        assert!(matches!(err, TaplineError::TapFailed { code: 5, signal: None }));
    }

    #[tokio::test]
    async fn hung_target_times_out() {
        let err = run_pipeline(
            &job("sleep 30", "cat", Some(Duration::from_millis(200))),
            &mut CancelSignal::never(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TaplineError::Timeout(_)));
    }

    #[tokio::test]
    async fn unrepresentable_timeout_means_no_deadline() {
        let report = run_pipeline(
            &job("echo hi", "cat", Some(Duration::from_secs(u64::MAX))),
            &mut CancelSignal::never(),
        )
        .await
        .unwrap();
        assert_eq!(report.target_output, b"hi\n");
    }

    #[tokio::test]
    async fn signalled_tap_names_the_signal() {
        let err = run_pipeline(&job("kill -TERM $$", "cat", None), &mut CancelSignal::never())
            .await
            .unwrap_err();
        assert!(
            matches!(err, TaplineError::TapFailed { code: -1, signal: Some(15) }),
            "{err:?}"
        );
        assert_eq!(err.to_string(), "tap exited with signal 15");
    }

    #[tokio::test]
    async fn signalled_target_names_the_signal() {
        let err = run_pipeline(
            &job("echo hi", "cat >/dev/null; kill -KILL $$", None),
            &mut CancelSignal::never(),
        )
        .await
        .unwrap_err();
        assert!(
            matches!(err, TaplineError::TargetFailed { signal: Some(9), .. }),
            "{err:?}"
        );
        assert!(err.to_string().starts_with("target exited with signal 9;"), "{err}");
    }

    #[tokio::test]
    async fn cancel_signal_stops_the_run() {
        let (tx, rx) = oneshot::channel();
        let mut cancel = CancelSignal::new(rx);
        tx.send(()).unwrap();

        let err = run_pipeline(&job("sleep 30", "cat", None), &mut cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, TaplineError::Cancelled));
    }

    #[tokio::test]
    async fn dropped_sender_does_not_cancel() {
        let (tx, rx) = oneshot::channel::<()>();
        drop(tx);
        let mut cancel = CancelSignal::new(rx);

        let report = run_pipeline(&job("echo hi", "cat", None), &mut cancel)
            .await
            .unwrap();
        assert_eq!(report.target_output, b"hi\n");
    }
}
