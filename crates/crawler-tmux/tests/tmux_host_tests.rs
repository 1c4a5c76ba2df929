//! Runner and host tests against a real tmux server.
//!
//! Each test owns a private socket and kills its server on drop. Tests return
//! early when tmux is not installed.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use crawler_tmux::{
    PaneState, ProcessHost, SessionSpec, TmuxError, TmuxHost, TmuxRunner, resolve_pane, socket,
    start_session,
};

struct ServerGuard(TmuxRunner);

impl Drop for ServerGuard {
    fn drop(&mut self) {
        let _ = self.0.run(&["kill-server"]);
    }
}

fn find_tmux() -> Option<PathBuf> {
    match which::which("tmux") {
        Ok(path) => Some(path),
        Err(_) => {
            eprintln!("skipping: tmux not found in PATH");
            None
        }
    }
}

fn shell_host(dir: &tempfile::TempDir, script: &str) -> Option<(TmuxHost, ServerGuard)> {
    let tmux = find_tmux()?;
    let socket = dir.path().join("test.sock");
    let config = socket::config_path_for(&socket);
    socket::write_config(&config, 0).expect("write config");
    let mut runner = TmuxRunner::new(tmux, socket);
    runner.set_config_path(config);
    let spec = SessionSpec {
        command: "/bin/sh".into(),
        args: vec!["-c".into(), script.into()],
        width: 80,
        height: 24,
        ..Default::default()
    };
    start_session(&runner, &spec).expect("start session");
    runner
        .wait_for_session(Duration::from_secs(5))
        .expect("session ready");
    let pane = resolve_pane(&runner).expect("pane id");
    assert!(pane.starts_with('%'), "unexpected pane id {pane:?}");
    let guard = ServerGuard(runner.clone());
    Some((TmuxHost::new(runner, pane), guard))
}

fn poll_capture(host: &TmuxHost, needle: &str) -> String {
    let deadline = Instant::now() + Duration::from_secs(3);
    let mut content = String::new();
    while Instant::now() < deadline {
        content = host.capture_pane().expect("capture");
        if content.contains(needle) {
            break;
        }
        thread::sleep(Duration::from_millis(20));
    }
    content
}

#[test]
fn test_version_reports_digits() {
    let Some(tmux) = find_tmux() else { return };
    let version = crawler_tmux::version(&tmux).expect("tmux -V");
    assert!(version.chars().any(|c| c.is_ascii_digit()), "{version:?}");
}

#[test]
fn test_run_against_missing_server_is_command_error() {
    let Some(tmux) = find_tmux() else { return };
    let dir = tempfile::tempdir().unwrap();
    let runner = TmuxRunner::new(tmux, dir.path().join("nonexistent.sock"));
    let err = runner.run(&["list-panes"]).unwrap_err();
    assert!(matches!(err, TmuxError::Command { ref op, .. } if op == "list-panes"));
    assert_eq!(err.operation(), "list-panes");
}

#[test]
fn test_capture_and_send_keys() {
    let dir = tempfile::tempdir().unwrap();
    let Some((host, _guard)) = shell_host(&dir, "printf 'ready>'; read line; echo \"got $line\"; read x")
    else {
        return;
    };

    assert!(poll_capture(&host, "ready>").contains("ready>"));
    host.send_literal("hello").unwrap();
    host.send_keys(&["Enter"]).unwrap();
    assert!(poll_capture(&host, "got hello").contains("got hello"));
}

#[test]
fn test_liveness_reports_exit_status() {
    let dir = tempfile::tempdir().unwrap();
    let Some((host, _guard)) = shell_host(&dir, "read line; exit 3") else {
        return;
    };

    assert_eq!(host.query_liveness().unwrap(), PaneState::alive());
    host.send_keys(&["Enter"]).unwrap();

    let deadline = Instant::now() + Duration::from_secs(3);
    let mut state = host.query_liveness().unwrap();
    while !state.dead && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
        state = host.query_liveness().unwrap();
    }
    assert_eq!(state, PaneState::exited(3));
}

#[test]
fn test_cursor_and_teardown() {
    let dir = tempfile::tempdir().unwrap();
    let Some((host, _guard)) = shell_host(&dir, "printf 'abc'; read line") else {
        return;
    };

    poll_capture(&host, "abc");
    assert_eq!(host.query_cursor().unwrap(), (0, 3));

    host.teardown().unwrap();
    assert!(host.capture_pane().is_err());
}
