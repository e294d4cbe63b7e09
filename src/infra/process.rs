//! Build tool subprocess execution
//!
//! Runs one external build tool invocation as: spawn, stream output
//! line-by-line to a callback, then race termination against a wall-clock
//! timeout. Failures to launch and timeouts are outcomes, not errors - the
//! caller turns them into per-module build results.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Callback invoked for every output line as it is produced
pub type LineCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// How the subprocess ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Exited on its own. Signal-terminated processes report status -1.
    Exited { code: i32 },
    /// Killed after exceeding the wall-clock bound
    TimedOut,
    /// Could not be spawned at all
    LaunchError { message: String },
}

/// Result of one subprocess invocation
#[derive(Debug)]
pub struct ProcessReport {
    /// Terminal outcome
    pub outcome: ProcessOutcome,
    /// Wall-clock time from launch to exit
    pub duration: Duration,
    /// Full captured output (stdout then stderr)
    pub output: String,
}

impl ProcessReport {
    /// Whether the subprocess exited zero
    pub fn success(&self) -> bool {
        matches!(self.outcome, ProcessOutcome::Exited { code: 0 })
    }
}

async fn drain_lines<R>(reader: R, on_line: Option<LineCallback>) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut captured = Vec::new();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(cb) = &on_line {
            cb(&line);
        }
        captured.push(line);
    }
    captured
}

/// Run a subprocess, streaming its output and bounding its runtime.
///
/// The full output is always captured and returned, independent of what the
/// callback chooses to display. On timeout the child is killed; the output
/// produced up to that point is still returned.
pub async fn run_streamed(
    program: &str,
    args: &[String],
    cwd: &Path,
    timeout: Duration,
    on_line: Option<LineCallback>,
) -> ProcessReport {
    let start = Instant::now();

    let spawned = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => {
            return ProcessReport {
                outcome: ProcessOutcome::LaunchError {
                    message: e.to_string(),
                },
                duration: start.elapsed(),
                output: String::new(),
            };
        }
    };

    // Drain both pipes concurrently so a full pipe can never wedge the child
    let stdout_task = child
        .stdout
        .take()
        .map(|out| tokio::spawn(drain_lines(out, on_line.clone())));
    let stderr_task = child
        .stderr
        .take()
        .map(|err| tokio::spawn(drain_lines(err, on_line.clone())));

    let outcome = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => ProcessOutcome::Exited {
            code: status.code().unwrap_or(-1),
        },
        Ok(Err(e)) => ProcessOutcome::LaunchError {
            message: e.to_string(),
        },
        Err(_) => {
            let _ = child.kill().await;
            ProcessOutcome::TimedOut
        }
    };

    let mut output_lines = Vec::new();
    if let Some(task) = stdout_task {
        if let Ok(lines) = task.await {
            output_lines.extend(lines);
        }
    }
    if let Some(task) = stderr_task {
        if let Ok(lines) = task.await {
            output_lines.extend(lines);
        }
    }

    let mut output = output_lines.join("\n");
    if !output.is_empty() {
        output.push('\n');
    }

    ProcessReport {
        outcome,
        duration: start.elapsed(),
        output,
    }
}
