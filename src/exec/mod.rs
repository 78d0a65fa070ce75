// src/exec/mod.rs

//! Execution pipeline: path resolution, venv detection, command
//! construction, and child process running.

pub mod command;
pub mod paths;
pub mod runner;
pub mod venv;

pub use command::{CommandSpec, ExecutionPlan, Invocation, ShellFlavor, host_shell};
pub use runner::{ProcessOutcome, run};
pub use venv::{Activation, EnvProbe, probe};
