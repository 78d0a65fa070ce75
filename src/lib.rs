// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod session;

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::exec::paths;
use crate::session::{RunOutcome, RunRequest, Session, SessionEvent};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - session construction (script home, venv layout)
/// - the run request from CLI + config
/// - Ctrl-C handling
/// - event rendering (child output to stdout, status to stderr)
pub async fn run(args: CliArgs) -> Result<RunOutcome> {
    let config_path = PathBuf::from(&args.config);
    let cfg = config::load_or_default(&config_path)?;

    let config_root = config_root_dir(&config_path);
    let base_dir = match cfg.script.base_dir.as_deref().filter(|s| !s.is_empty()) {
        Some(dir) => paths::to_absolute(dir, Some(&config_root)),
        None => config_root,
    };

    let session = build_session(&cfg, base_dir);
    let request = build_request(&args, &cfg);

    if args.dry_run {
        print_dry_run(&session, &request);
        return Ok(RunOutcome::Exited(0));
    }

    let mut handle = session.execute(request)?;

    // Ctrl-C → cancel the run; the session still emits its terminal event.
    if let Some(canceller) = handle.take_canceller() {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                canceller.cancel();
            }
        });
    }

    let mut outcome = None;
    while let Some(event) = handle.next_event().await {
        match event {
            SessionEvent::Log(line) => println!("{line}"),
            SessionEvent::Status(text) => eprintln!("==> {text}"),
            SessionEvent::Finished(o) => outcome = Some(o),
        }
    }

    outcome.ok_or_else(|| anyhow!("session ended without a terminal outcome"))
}

fn build_session(cfg: &ConfigFile, base_dir: PathBuf) -> Session {
    let mut session =
        Session::new(base_dir.clone()).with_venv_dir(cfg.env.venv_dir.clone());

    if let Ok(cwd) = std::env::current_dir() {
        session = session.with_workspace_dir(cwd);
    }

    if let Some(path) = cfg.script.path.as_deref().filter(|s| !s.is_empty()) {
        session = session.with_default_script(paths::to_absolute(path, Some(&base_dir)));
    }

    session
}

fn build_request(args: &CliArgs, cfg: &ConfigFile) -> RunRequest {
    RunRequest {
        operator: args.operator.clone(),
        source_paths: args.sources.clone(),
        script: args.script.clone(),
        fewshot_file: args.fewshot.clone(),
        output_file: cfg.script.output_file.clone(),
        prompt_file: cfg.script.prompt_file.clone(),
        api_key: cfg.api.key.clone(),
        base_url: cfg.api.base_url.clone(),
        model: cfg.api.model.clone(),
        use_venv: cfg.env.use_venv && !args.no_venv,
    }
}

/// Directory containing the config file, made absolute; falls back to the
/// current working directory for a bare filename.
fn config_root_dir(config_path: &Path) -> PathBuf {
    let abs = paths::to_absolute(&config_path.display().to_string(), None);
    abs.parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Simple dry-run output: print the resolved invocation without executing.
fn print_dry_run(session: &Session, request: &RunRequest) {
    let script = session.resolved_script(request);
    let args = request.positional_args(|p| {
        paths::to_absolute(p, None).display().to_string()
    });

    println!("utrun dry-run");
    println!("  script: {}", script.display());
    println!(
        "  contract: {}",
        if request.has_full_contract() { "full" } else { "wrapper" }
    );
    println!("  args:");
    for arg in &args {
        println!("    - {arg}");
    }
    if request.use_venv {
        println!("  venv candidates:");
        for dir in session.venv_candidates() {
            println!("    - {}", dir.display());
        }
    } else {
        println!("  venv: disabled");
    }
}
