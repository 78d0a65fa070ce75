// src/session/mod.rs

//! Session layer: the orchestrator entry point and its event protocol.
//!
//! A caller builds a [`RunRequest`], hands it to [`Session::execute`], and
//! consumes the resulting event stream:
//! - [`SessionEvent::Log`]: one line of child output or a diagnostic
//! - [`SessionEvent::Status`]: human-readable progress updates
//! - [`SessionEvent::Finished`]: exactly one per request, always last

pub mod controller;
pub mod request;

pub use controller::{Canceller, Session, SessionHandle};
pub use request::{RequestError, RunRequest};

use std::path::PathBuf;

/// Events emitted over the lifetime of one run request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Log(String),
    Status(String),
    Finished(RunOutcome),
}

/// Terminal result of one run request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The child process exited normally with this code.
    Exited(i32),
    /// The child was cancelled or terminated by a signal.
    Killed,
    /// The target script does not exist; no process was launched.
    ScriptMissing(PathBuf),
    /// Spawning the process itself failed (not runnable, permissions, ...).
    LaunchFailed(String),
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        matches!(self, RunOutcome::Exited(0))
    }
}
