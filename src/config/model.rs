// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from a TOML file:
///
/// ```toml
/// [script]
/// path = "entrypoint.sh"
/// base_dir = "/opt/utgen"
///
/// [env]
/// use_venv = true
/// venv_dir = ".venv"
///
/// [api]
/// key = "sk-..."
/// base_url = "https://..."
/// model = "..."
/// ```
///
/// All sections are optional and have reasonable defaults; the file itself
/// is optional too.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub script: ScriptSection,

    #[serde(default)]
    pub env: EnvSection,

    #[serde(default)]
    pub api: ApiSection,
}

/// `[script]` section: where the generation script lives and the optional
/// output/prompt files handed to it under the full argument contract.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptSection {
    /// Explicit script path; relative paths resolve against `base_dir`.
    #[serde(default)]
    pub path: Option<String>,

    /// Home of the scripts and the child's working directory. Relative
    /// paths resolve against the config file's directory, which is also
    /// the default.
    #[serde(default)]
    pub base_dir: Option<String>,

    #[serde(default)]
    pub output_file: Option<String>,

    #[serde(default)]
    pub prompt_file: Option<String>,
}

/// `[env]` section: virtual environment behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvSection {
    /// Activate a virtual environment before running the script.
    #[serde(default = "default_use_venv")]
    pub use_venv: bool,

    /// Directory name probed for under the base and workspace directories.
    #[serde(default = "default_venv_dir")]
    pub venv_dir: String,
}

fn default_use_venv() -> bool {
    true
}

fn default_venv_dir() -> String {
    ".venv".to_string()
}

impl Default for EnvSection {
    fn default() -> Self {
        Self {
            use_venv: default_use_venv(),
            venv_dir: default_venv_dir(),
        }
    }
}

/// `[api]` section: opaque pass-through values for the generation script.
/// Never validated or logged here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiSection {
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub model: Option<String>,
}
