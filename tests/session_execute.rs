#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use utrun::session::{RequestError, RunOutcome, RunRequest, Session, SessionEvent, SessionHandle};

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn request(operator: &str, sources: &[&str]) -> RunRequest {
    RunRequest {
        operator: operator.to_string(),
        source_paths: sources.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

async fn collect(mut handle: SessionHandle) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        events.push(event);
    }
    events
}

fn statuses(events: &[SessionEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Status(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn logs(events: &[SessionEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Log(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn outcome(events: &[SessionEvent]) -> &RunOutcome {
    match events.last() {
        Some(SessionEvent::Finished(outcome)) => outcome,
        other => panic!("expected Finished as the last event, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_script_fails_before_launching_anything() {
    let tmp = tempfile::tempdir().unwrap();
    let session = Session::new(tmp.path().to_path_buf());

    let mut req = request("AllGatherMatmul", &["/ops/agm"]);
    req.script = Some("does_not_exist.sh".to_string());

    let events = collect(session.execute(req).unwrap()).await;

    assert_eq!(statuses(&events), vec!["failed: script not found"]);
    let expected = tmp.path().join("does_not_exist.sh");
    assert_eq!(outcome(&events), &RunOutcome::ScriptMissing(expected));
    // Diagnostics only; the process never started.
    assert!(logs(&events).iter().any(|l| l.contains("no such script")));
    assert!(!statuses(&events).contains(&"starting"));
}

#[tokio::test]
async fn direct_run_streams_output_and_succeeds() {
    let tmp = tempfile::tempdir().unwrap();
    write_script(
        tmp.path(),
        "entrypoint.sh",
        r#"for a in "$@"; do echo "arg:$a"; done"#,
    );
    let session = Session::new(tmp.path().to_path_buf());

    let events = collect(session.execute(request("AllGatherMatmul", &["/ops/agm"])).unwrap()).await;

    assert_eq!(statuses(&events), vec!["starting", "succeeded"]);
    assert_eq!(outcome(&events), &RunOutcome::Exited(0));

    let logs = logs(&events);
    let arg_lines: Vec<&&str> = logs.iter().filter(|l| l.starts_with("arg:")).collect();
    assert_eq!(arg_lines, vec![&"arg:AllGatherMatmul", &"arg:/ops/agm"]);
}

#[tokio::test]
async fn nonzero_exit_is_reported_with_its_code() {
    let tmp = tempfile::tempdir().unwrap();
    write_script(tmp.path(), "entrypoint.sh", "echo boom >&2\nexit 3");
    let session = Session::new(tmp.path().to_path_buf());

    let events = collect(session.execute(request("Op", &["/ops/x"])).unwrap()).await;

    assert_eq!(statuses(&events), vec!["starting", "failed with exit code 3"]);
    assert_eq!(outcome(&events), &RunOutcome::Exited(3));
    assert!(logs(&events).contains(&"boom"));
}

#[tokio::test]
async fn stderr_and_stdout_are_both_forwarded() {
    let tmp = tempfile::tempdir().unwrap();
    write_script(tmp.path(), "entrypoint.sh", "echo out-line\necho err-line >&2");
    let session = Session::new(tmp.path().to_path_buf());

    let events = collect(session.execute(request("Op", &["/ops/x"])).unwrap()).await;

    let logs = logs(&events);
    assert!(logs.contains(&"out-line"));
    assert!(logs.contains(&"err-line"));
    assert_eq!(outcome(&events), &RunOutcome::Exited(0));
}

#[tokio::test]
async fn venv_not_found_lists_candidates_and_still_runs() {
    let tmp = tempfile::tempdir().unwrap();
    let workspace = tempfile::tempdir().unwrap();
    write_script(tmp.path(), "entrypoint.sh", "echo ran");

    let session = Session::new(tmp.path().to_path_buf())
        .with_workspace_dir(workspace.path().to_path_buf());

    let mut req = request("Op", &["/ops/x"]);
    req.use_venv = true;

    let events = collect(session.execute(req).unwrap()).await;

    let logs = logs(&events);
    assert!(logs.contains(&"no virtual environment found; checked:"));
    let base_candidate = format!("  - {}", tmp.path().join(".venv").display());
    let ws_candidate = format!("  - {}", workspace.path().join(".venv").display());
    assert!(logs.contains(&base_candidate.as_str()));
    assert!(logs.contains(&ws_candidate.as_str()));

    // Degrades to an unactivated shell run, not a failure.
    assert!(logs.contains(&"ran"));
    assert_eq!(outcome(&events), &RunOutcome::Exited(0));
}

#[tokio::test]
async fn venv_activation_is_sourced_before_the_script() {
    let tmp = tempfile::tempdir().unwrap();
    let venv_bin = tmp.path().join(".venv").join("bin");
    fs::create_dir_all(&venv_bin).unwrap();
    fs::write(venv_bin.join("activate"), "export UTRUN_TEST_ACTIVATED=yes\n").unwrap();

    write_script(tmp.path(), "entrypoint.sh", "echo activated=$UTRUN_TEST_ACTIVATED");
    let session = Session::new(tmp.path().to_path_buf());

    let mut req = request("Op", &["/ops/x"]);
    req.use_venv = true;

    let events = collect(session.execute(req).unwrap()).await;

    let logs = logs(&events);
    let found = format!("found virtual environment: {}", tmp.path().join(".venv").display());
    assert!(logs.contains(&found.as_str()));
    assert!(logs.contains(&"activated=yes"));
    assert_eq!(outcome(&events), &RunOutcome::Exited(0));
}

#[tokio::test]
async fn child_runs_in_the_base_directory() {
    let tmp = tempfile::tempdir().unwrap();
    write_script(tmp.path(), "entrypoint.sh", "pwd");
    let session = Session::new(tmp.path().to_path_buf());

    let events = collect(session.execute(request("Op", &["/ops/x"])).unwrap()).await;

    let base = fs::canonicalize(tmp.path()).unwrap();
    let logs = logs(&events);
    assert!(
        logs.iter().any(|l| {
            Path::new(l)
                .canonicalize()
                .map(|p| p == base)
                .unwrap_or(false)
        }),
        "expected pwd output matching {base:?} in {logs:?}"
    );
}

#[tokio::test]
async fn unrunnable_script_is_a_launch_failure_not_an_exit_code() {
    let tmp = tempfile::tempdir().unwrap();
    // Present but not executable: passes existence validation, fails spawn.
    let path = tmp.path().join("entrypoint.sh");
    fs::write(&path, "#!/bin/sh\necho hi\n").unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o644);
    fs::set_permissions(&path, perms).unwrap();

    let session = Session::new(tmp.path().to_path_buf());
    let events = collect(session.execute(request("Op", &["/ops/x"])).unwrap()).await;

    assert_eq!(statuses(&events), vec!["starting", "failed to launch"]);
    match outcome(&events) {
        RunOutcome::LaunchFailed(reason) => {
            assert!(reason.contains("entrypoint.sh"), "reason: {reason}");
        }
        other => panic!("expected LaunchFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn cancellation_kills_the_child_and_still_terminates() {
    let tmp = tempfile::tempdir().unwrap();
    write_script(tmp.path(), "entrypoint.sh", "echo sleeping\nsleep 30");
    let session = Session::new(tmp.path().to_path_buf());

    let mut handle = session.execute(request("Op", &["/ops/x"])).unwrap();
    let canceller = handle.take_canceller().unwrap();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        canceller.cancel();
    });

    let events = tokio::time::timeout(Duration::from_secs(10), collect(handle))
        .await
        .expect("cancelled session must still terminate");

    assert_eq!(outcome(&events), &RunOutcome::Killed);
    assert!(statuses(&events).contains(&"killed"));
}

#[tokio::test]
async fn invalid_request_is_rejected_synchronously() {
    let tmp = tempfile::tempdir().unwrap();
    let session = Session::new(tmp.path().to_path_buf());

    let err = session.execute(request("", &["/ops/x"])).unwrap_err();
    assert_eq!(err, RequestError::EmptyOperator);

    let err = session.execute(request("Op", &[])).unwrap_err();
    assert_eq!(err, RequestError::NoSourcePaths);
}
