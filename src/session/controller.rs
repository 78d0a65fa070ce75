// src/session/controller.rs

//! The session controller: validates a request, probes the environment,
//! builds the execution plan, runs the process, and relays events.

use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::exec::command::{ExecutionPlan, Invocation};
use crate::exec::runner::ProcessOutcome;
use crate::exec::{paths, runner, venv};
use crate::session::{RequestError, RunOutcome, RunRequest, SessionEvent};

/// Well-known script name used when neither the request nor the config
/// names one; lives in the base directory.
const DEFAULT_SCRIPT_NAME: &str = "entrypoint.sh";

/// Orchestrator for generation runs.
///
/// A `Session` holds the directory layout (where scripts and venvs live)
/// and executes one [`RunRequest`] at a time per call. Concurrent calls are
/// not coordinated; callers that need serialization must provide it.
#[derive(Debug, Clone)]
pub struct Session {
    /// Home of the generation scripts; also the child's working directory
    /// so the script finds its sibling config files.
    base_dir: PathBuf,
    /// Base for resolving user-supplied relative paths (the workspace the
    /// operator sources live in). `None` resolves against the current
    /// working directory.
    workspace_dir: Option<PathBuf>,
    /// Venv directory name probed under the candidate roots.
    venv_dir: String,
    /// Default script from configuration, if any.
    default_script: Option<PathBuf>,
}

/// Handle to one in-flight run: the event stream plus a cancel signal.
#[derive(Debug)]
pub struct SessionHandle {
    events: mpsc::Receiver<SessionEvent>,
    cancel: Option<oneshot::Sender<()>>,
}

impl SessionHandle {
    /// Next event, or `None` once the stream is exhausted. The last event
    /// delivered is always [`SessionEvent::Finished`].
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Split off the cancellation handle so another task can cancel while
    /// this handle keeps consuming events. Returns `None` if already taken.
    pub fn take_canceller(&mut self) -> Option<Canceller> {
        self.cancel.take().map(|tx| Canceller { tx })
    }
}

/// One-shot cancellation of a running session.
#[derive(Debug)]
pub struct Canceller {
    tx: oneshot::Sender<()>,
}

impl Canceller {
    /// Ask the session to kill its child process. The session still emits a
    /// terminal `Finished(Killed)` event.
    pub fn cancel(self) {
        let _ = self.tx.send(());
    }
}

impl Session {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            workspace_dir: None,
            venv_dir: ".venv".to_string(),
            default_script: None,
        }
    }

    pub fn with_workspace_dir(mut self, dir: PathBuf) -> Self {
        self.workspace_dir = Some(dir);
        self
    }

    pub fn with_venv_dir(mut self, name: impl Into<String>) -> Self {
        self.venv_dir = name.into();
        self
    }

    pub fn with_default_script(mut self, script: PathBuf) -> Self {
        self.default_script = Some(script);
        self
    }

    /// The script a request will run: explicit request path first, then the
    /// configured default, then `entrypoint.sh` next to the base directory.
    pub fn resolved_script(&self, request: &RunRequest) -> PathBuf {
        if let Some(script) = request.script.as_deref().filter(|s| !s.is_empty()) {
            return paths::to_absolute(script, Some(&self.base_dir));
        }
        if let Some(script) = &self.default_script {
            return script.clone();
        }
        self.base_dir.join(DEFAULT_SCRIPT_NAME)
    }

    /// Venv candidate roots in priority order: the script home first, then
    /// the workspace.
    pub fn venv_candidates(&self) -> Vec<PathBuf> {
        let mut candidates = vec![self.base_dir.join(&self.venv_dir)];
        if let Some(workspace) = &self.workspace_dir {
            candidates.push(workspace.join(&self.venv_dir));
        }
        candidates
    }

    /// Start executing a request. Validation failures are returned
    /// synchronously; everything after that is reported on the event
    /// stream, which ends with exactly one [`SessionEvent::Finished`].
    ///
    /// Must be called within a Tokio runtime.
    pub fn execute(&self, request: RunRequest) -> Result<SessionHandle, RequestError> {
        request.validate()?;

        let (tx, rx) = mpsc::channel::<SessionEvent>(64);
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

        let session = self.clone();
        tokio::spawn(async move {
            session.execute_inner(request, tx, cancel_rx).await;
        });

        Ok(SessionHandle {
            events: rx,
            cancel: Some(cancel_tx),
        })
    }

    async fn execute_inner(
        self,
        request: RunRequest,
        tx: mpsc::Sender<SessionEvent>,
        cancel_rx: oneshot::Receiver<()>,
    ) {
        let script = self.resolved_script(&request);

        let _ = log(&tx, format!("base directory: {}", self.base_dir.display())).await;
        let _ = log(&tx, format!("script: {}", script.display())).await;

        if !script.is_file() {
            warn!(script = %script.display(), "script not found");
            let _ = status(&tx, "failed: script not found").await;
            let _ = log(&tx, format!("no such script: {}", script.display())).await;
            let _ = tx
                .send(SessionEvent::Finished(RunOutcome::ScriptMissing(script)))
                .await;
            return;
        }

        let invocation = if request.use_venv {
            let probe = venv::probe(&self.venv_candidates());
            match &probe.activation {
                Some(activation) => {
                    let _ = log(
                        &tx,
                        format!("found virtual environment: {}", activation.root.display()),
                    )
                    .await;
                }
                None => {
                    let _ = log(&tx, "no virtual environment found; checked:".to_string()).await;
                    for dir in &probe.checked {
                        let _ = log(&tx, format!("  - {}", dir.display())).await;
                    }
                    let _ = log(&tx, "continuing with the system environment".to_string()).await;
                }
            }
            Invocation::Shell {
                activation: probe.activation.map(|a| a.script),
            }
        } else {
            Invocation::Direct
        };

        let workspace = self.workspace_dir.as_deref();
        let args = request
            .positional_args(|p| paths::to_absolute(p, workspace).display().to_string());

        let plan = ExecutionPlan {
            script,
            workdir: self.base_dir.clone(),
            args,
            invocation,
        };
        debug!(?plan, "execution plan built");

        let spec = plan.to_host_command();

        let _ = status(&tx, "starting").await;
        info!(operator = %request.operator, "starting generation run");

        match runner::run(&spec, &plan.workdir, &tx, cancel_rx).await {
            Ok(outcome) => {
                let text = match outcome {
                    ProcessOutcome::Exited(0) => "succeeded".to_string(),
                    ProcessOutcome::Exited(code) => {
                        format!("failed with exit code {code}")
                    }
                    ProcessOutcome::Killed => "killed".to_string(),
                };
                let _ = status(&tx, text).await;

                let outcome = match outcome {
                    ProcessOutcome::Exited(code) => RunOutcome::Exited(code),
                    ProcessOutcome::Killed => RunOutcome::Killed,
                };
                let _ = tx.send(SessionEvent::Finished(outcome)).await;
            }
            Err(err) => {
                warn!(error = %err, "failed to launch script");
                let _ = status(&tx, "failed to launch").await;
                let _ = log(&tx, format!("{err:#}")).await;
                let _ = tx
                    .send(SessionEvent::Finished(RunOutcome::LaunchFailed(format!(
                        "{err:#}"
                    ))))
                    .await;
            }
        }
    }
}

async fn log(
    tx: &mpsc::Sender<SessionEvent>,
    text: impl Into<String>,
) -> Result<(), mpsc::error::SendError<SessionEvent>> {
    tx.send(SessionEvent::Log(text.into())).await
}

async fn status(
    tx: &mpsc::Sender<SessionEvent>,
    text: impl Into<String>,
) -> Result<(), mpsc::error::SendError<SessionEvent>> {
    tx.send(SessionEvent::Status(text.into())).await
}
