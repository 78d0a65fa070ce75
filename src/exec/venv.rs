// src/exec/venv.rs

//! Virtual environment detection.
//!
//! Given an ordered list of candidate directories, find the first one that
//! contains an activation script for the host platform. This is a pure
//! filesystem existence check; the script is never read or executed here.

use std::path::{Path, PathBuf};

use tracing::debug;

/// A located virtual environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// The venv root directory (the candidate that matched).
    pub root: PathBuf,
    /// Full path to the activation script inside it.
    pub script: PathBuf,
}

/// Result of scanning candidate directories for a virtual environment.
///
/// `checked` always holds every directory probed, in priority order, so
/// callers can produce a diagnostic trail when nothing was found.
#[derive(Debug, Clone)]
pub struct EnvProbe {
    pub checked: Vec<PathBuf>,
    pub activation: Option<Activation>,
}

impl EnvProbe {
    pub fn found(&self) -> bool {
        self.activation.is_some()
    }
}

/// Relative path of the activation artifact for the host platform.
///
/// Unix venvs put a shell-sourced `activate` under `bin/`; Windows venvs
/// put `activate.bat` under `Scripts\`.
fn activation_script(venv_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        venv_dir.join("Scripts").join("activate.bat")
    } else {
        venv_dir.join("bin").join("activate")
    }
}

/// Probe candidate directories in order, stopping at the first one with a
/// valid activation script.
pub fn probe(candidates: &[PathBuf]) -> EnvProbe {
    let mut checked = Vec::with_capacity(candidates.len());

    for dir in candidates {
        let script = activation_script(dir);
        debug!(dir = %dir.display(), script = %script.display(), "probing venv candidate");
        checked.push(dir.clone());

        if script.is_file() {
            return EnvProbe {
                checked,
                activation: Some(Activation {
                    root: dir.clone(),
                    script,
                }),
            };
        }
    }

    EnvProbe {
        checked,
        activation: None,
    }
}
