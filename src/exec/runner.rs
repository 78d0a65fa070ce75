// src/exec/runner.rs

//! Child process execution with live output streaming.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::exec::command::CommandSpec;
use crate::session::SessionEvent;

/// How the child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Normal exit with a code (0 = success).
    Exited(i32),
    /// Terminated by cancellation or a signal; no exit code available.
    Killed,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        matches!(self, ProcessOutcome::Exited(0))
    }
}

/// Launch the command and stream its output until it exits.
///
/// Every line received on stdout or stderr is forwarded as a
/// [`SessionEvent::Log`] in arrival order per stream; ordering between the
/// two streams is best-effort. The future resolves only once the child has
/// fully exited and both reader tasks have drained, so no log event trails
/// the returned outcome. On a killed child the readers are stopped rather
/// than drained: an orphaned descendant can keep the pipes open past the
/// kill, and the outcome must not wait on it.
///
/// If `cancel_rx` fires, the child is killed and the outcome is
/// [`ProcessOutcome::Killed`]. A spawn failure (missing interpreter,
/// permission denied) is an `Err`, distinct from a non-zero exit.
pub async fn run(
    spec: &CommandSpec,
    workdir: &Path,
    events: &mpsc::Sender<SessionEvent>,
    mut cancel_rx: oneshot::Receiver<()>,
) -> Result<ProcessOutcome> {
    info!(
        program = %spec.program,
        args = ?spec.args,
        workdir = %workdir.display(),
        "launching child process"
    );

    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .current_dir(workdir)
        .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning '{}'", spec.program))?;

    let stdout_reader = child
        .stdout
        .take()
        .map(|out| spawn_line_forwarder(out, events.clone()));
    let stderr_reader = child
        .stderr
        .take()
        .map(|err| spawn_line_forwarder(err, events.clone()));

    // Either the process exits on its own, or a cancellation request arrives
    // and we kill it. A dropped cancel handle just means the caller gave up
    // the ability to cancel; keep waiting for a normal exit.
    let outcome = tokio::select! {
        status = child.wait() => {
            let status = status.context("waiting for child process")?;
            match status.code() {
                Some(code) => ProcessOutcome::Exited(code),
                None => ProcessOutcome::Killed,
            }
        }
        cancel = &mut cancel_rx => match cancel {
            Ok(()) => {
                info!("cancellation requested; killing child process");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill child process");
                }
                ProcessOutcome::Killed
            }
            Err(_) => {
                let status = child.wait().await.context("waiting for child process")?;
                match status.code() {
                    Some(code) => ProcessOutcome::Exited(code),
                    None => ProcessOutcome::Killed,
                }
            }
        },
    };

    // Drain remaining buffered output before reporting the outcome. A killed
    // child may leave descendants holding the pipe write ends, so draining
    // could block indefinitely; stop the forwarders instead of waiting for
    // an EOF that may never come.
    match outcome {
        ProcessOutcome::Killed => {
            // Await after aborting so no forwarder is still mid-send when
            // the terminal event goes out.
            if let Some(handle) = stdout_reader {
                handle.abort();
                let _ = handle.await;
            }
            if let Some(handle) = stderr_reader {
                handle.abort();
                let _ = handle.await;
            }
        }
        ProcessOutcome::Exited(_) => {
            if let Some(handle) = stdout_reader {
                let _ = handle.await;
            }
            if let Some(handle) = stderr_reader {
                let _ = handle.await;
            }
        }
    }

    info!(?outcome, "child process finished");
    Ok(outcome)
}

/// Forward each line from the given pipe as a `Log` event.
fn spawn_line_forwarder<R>(
    pipe: R,
    events: mpsc::Sender<SessionEvent>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let reader = BufReader::new(pipe);
        let mut lines = reader.lines();

        while let Ok(Some(line)) = lines.next_line().await {
            if events.send(SessionEvent::Log(line)).await.is_err() {
                // Receiver gone; keep draining so the pipe doesn't fill.
                debug!("event receiver dropped; discarding remaining output");
                while let Ok(Some(_)) = lines.next_line().await {}
                break;
            }
        }
    })
}
