// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `utrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "utrun",
    version,
    about = "Run operator unit-test generation scripts with live output.",
    long_about = None
)]
pub struct CliArgs {
    /// Operator name, e.g. AllGatherMatmul.
    #[arg(value_name = "OPERATOR")]
    pub operator: String,

    /// Operator source directories (one or more).
    #[arg(value_name = "SOURCE", required = true)]
    pub sources: Vec<String>,

    /// Few-shot example file.
    #[arg(long, value_name = "PATH")]
    pub fewshot: Option<String>,

    /// Generation script to run instead of the configured default.
    #[arg(long, value_name = "PATH")]
    pub script: Option<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Utrun.toml` in the current working directory; a missing
    /// file falls back to built-in defaults.
    #[arg(long, value_name = "PATH", default_value = "Utrun.toml")]
    pub config: String,

    /// Do not activate a virtual environment, even if configured.
    #[arg(long)]
    pub no_venv: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `UTRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve the script, venv, and argument list, print them, and exit
    /// without executing anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
