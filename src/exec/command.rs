// src/exec/command.rs

//! Command construction for one script invocation.
//!
//! An [`ExecutionPlan`] is the fully resolved description of a run: which
//! script, which working directory, which positional arguments, and whether
//! the invocation goes through a shell (for venv activation) or straight to
//! the script. Turning a plan into a [`CommandSpec`] is deterministic: the
//! same plan always yields the same spec.
//!
//! Platform differences (cmd.exe vs a POSIX shell) live behind the
//! [`ShellFlavor`] trait rather than `cfg!` branches scattered through the
//! call sites.

use std::path::{Path, PathBuf};

/// How the script is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Execute the script directly; arguments are separate argv entries and
    /// no shell parses them.
    Direct,
    /// Wrap in the host shell, sourcing the activation script first when one
    /// was found. `activation = None` means the venv was requested but not
    /// found; the run proceeds without activation.
    Shell { activation: Option<PathBuf> },
}

/// Fully resolved, ready-to-launch description of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// Absolute path to the target script.
    pub script: PathBuf,
    /// Working directory for the child process.
    pub workdir: PathBuf,
    /// Positional arguments, already resolved and ordered.
    pub args: Vec<String>,
    pub invocation: Invocation,
}

/// The concrete program + argv to hand to the process runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment variables layered over the inherited environment.
    pub env: Vec<(String, String)>,
}

/// Platform strategy for shell-wrapped invocations.
pub trait ShellFlavor: Send + Sync {
    /// The shell executable, e.g. `cmd.exe` or `/bin/bash`.
    fn program(&self) -> &'static str;
    /// The flag that makes the shell run a command string (`/c`, `-c`).
    fn command_flag(&self) -> &'static str;
    /// Command fragment that enters the venv via its activation script.
    fn activation_command(&self, script: &Path) -> String;
    /// Command fragment that changes into the working directory.
    fn cd_command(&self, dir: &Path) -> String;
}

pub struct CmdExe;

impl ShellFlavor for CmdExe {
    fn program(&self) -> &'static str {
        "cmd.exe"
    }

    fn command_flag(&self) -> &'static str {
        "/c"
    }

    fn activation_command(&self, script: &Path) -> String {
        // activate.bat is run directly, not sourced, under cmd.exe.
        quote(&script.display().to_string())
    }

    fn cd_command(&self, dir: &Path) -> String {
        // `/d` also switches drives if needed.
        format!("cd /d {}", quote(&dir.display().to_string()))
    }
}

pub struct PosixShell;

impl ShellFlavor for PosixShell {
    fn program(&self) -> &'static str {
        "/bin/bash"
    }

    fn command_flag(&self) -> &'static str {
        "-c"
    }

    fn activation_command(&self, script: &Path) -> String {
        format!("source {}", quote(&script.display().to_string()))
    }

    fn cd_command(&self, dir: &Path) -> String {
        format!("cd {}", quote(&dir.display().to_string()))
    }
}

/// The shell strategy for the platform we are running on.
pub fn host_shell() -> &'static dyn ShellFlavor {
    if cfg!(windows) { &CmdExe } else { &PosixShell }
}

/// Double-quote a token for the composed shell command line so paths with
/// spaces stay single arguments. Embedded double quotes are not supported.
fn quote(s: &str) -> String {
    format!("\"{s}\"")
}

impl ExecutionPlan {
    /// Build the concrete command for this plan using the host platform's
    /// shell and current working directory.
    pub fn to_host_command(&self) -> CommandSpec {
        let launch_dir = std::env::current_dir().unwrap_or_default();
        self.to_command(host_shell(), &launch_dir)
    }

    /// Build the concrete command for this plan.
    ///
    /// `launch_dir` is the directory the orchestrator itself runs in; the
    /// `cd` prefix is only emitted when the plan's workdir differs from it.
    pub fn to_command(&self, shell: &dyn ShellFlavor, launch_dir: &Path) -> CommandSpec {
        match &self.invocation {
            Invocation::Direct => CommandSpec {
                program: self.script.display().to_string(),
                args: self.args.clone(),
                env: Vec::new(),
            },
            Invocation::Shell { activation } => {
                let mut parts: Vec<String> = Vec::new();

                if let Some(activation) = activation {
                    parts.push(shell.activation_command(activation));
                }
                if self.workdir != launch_dir {
                    parts.push(shell.cd_command(&self.workdir));
                }

                let mut script_and_args = vec![quote(&self.script.display().to_string())];
                script_and_args.extend(self.args.iter().map(|a| quote(a)));
                parts.push(script_and_args.join(" "));

                CommandSpec {
                    program: shell.program().to_string(),
                    args: vec![shell.command_flag().to_string(), parts.join(" && ")],
                    env: Vec::new(),
                }
            }
        }
    }
}
