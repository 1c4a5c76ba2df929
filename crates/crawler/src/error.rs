//! Library errors with structured context.
//!
//! Every message starts with `crawler: <op>: ` so a failing test names the
//! operation that stopped it. Wait failures carry the last matcher
//! description and the recent capture history.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crawler_core::Screen;
use crawler_tmux::TmuxError;
use serde_json::{Value, json};
use thiserror::Error;

use crate::wait::render_history;

#[derive(Error, Debug)]
pub enum CrawlerError {
    /// tmux is missing or too old.
    #[error("crawler: {op}: {source}")]
    Environment {
        op: &'static str,
        #[source]
        source: TmuxError,
        /// The tmux path came from the caller rather than discovery.
        explicit: bool,
    },
    #[error("crawler: {op}: {source}")]
    Tmux {
        op: &'static str,
        #[source]
        source: TmuxError,
    },
    #[error("crawler: {op}: {reason}")]
    InvalidConfig { op: &'static str, reason: String },
    #[error(
        "crawler: {op}: timed out after {timeout:?}\n    {}\n    recent screen captures (oldest to newest):\n{}",
        expectation(.waiting_for),
        render_history(.history)
    )]
    Timeout {
        op: &'static str,
        timeout: Duration,
        /// `None` for `wait-exit`, which has no matcher.
        waiting_for: Option<String>,
        history: Vec<Screen>,
    },
    #[error(
        "crawler: {op}: process exited unexpectedly (status {status})\n    waiting for: {waiting_for}\n    recent screen captures (oldest to newest):\n{}",
        render_history(.history)
    )]
    ProcessDied {
        op: &'static str,
        status: i32,
        waiting_for: String,
        history: Vec<Screen>,
    },
    #[error("crawler: {op}: process exited unexpectedly (status {status})")]
    ProcessExited { op: &'static str, status: i32 },
    #[error(
        "crawler: snapshot: golden file not found: {}\nRun with CRAWLER_UPDATE=1 to create it.\n\nActual screen:\n{actual}",
        .path.display()
    )]
    SnapshotMissing { path: PathBuf, actual: String },
    #[error(
        "crawler: snapshot: mismatch for {name:?}\nGolden file: {}\nRun with CRAWLER_UPDATE=1 to update.\n\n--- golden ---\n{golden}\n--- actual ---\n{actual}",
        .path.display()
    )]
    SnapshotMismatch {
        name: String,
        path: PathBuf,
        golden: String,
        actual: String,
    },
    #[error("crawler: {op}: {action} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn expectation(waiting_for: &Option<String>) -> String {
    match waiting_for {
        Some(description) => format!("waiting for: {}", description),
        None => "pane still alive".to_string(),
    }
}

impl CrawlerError {
    pub(crate) fn tmux(op: &'static str) -> impl FnOnce(TmuxError) -> CrawlerError {
        move |source| CrawlerError::Tmux { op, source }
    }

    /// The library operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            CrawlerError::Environment { op, .. }
            | CrawlerError::Tmux { op, .. }
            | CrawlerError::InvalidConfig { op, .. }
            | CrawlerError::Timeout { op, .. }
            | CrawlerError::ProcessDied { op, .. }
            | CrawlerError::ProcessExited { op, .. }
            | CrawlerError::Io { op, .. } => op,
            CrawlerError::SnapshotMissing { .. } | CrawlerError::SnapshotMismatch { .. } => {
                "snapshot"
            }
        }
    }

    /// True when the environment cannot run the test at all and the tmux
    /// binary was auto-discovered. Such failures skip instead of fail.
    pub fn is_skip(&self) -> bool {
        matches!(self, CrawlerError::Environment { explicit: false, .. })
    }

    /// Exit status of the driven process, when the error is about its exit.
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            CrawlerError::ProcessDied { status, .. } | CrawlerError::ProcessExited { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Screens captured just before a wait failed, oldest first.
    pub fn history(&self) -> &[Screen] {
        match self {
            CrawlerError::Timeout { history, .. } | CrawlerError::ProcessDied { history, .. } => {
                history
            }
            _ => &[],
        }
    }

    /// Returns structured context about the error for debugging.
    pub fn context(&self) -> Value {
        match self {
            CrawlerError::Environment {
                op,
                source,
                explicit,
            } => json!({
                "operation": op,
                "explicit": explicit,
                "tmux": source.context(),
            }),
            CrawlerError::Tmux { op, source } => json!({
                "operation": op,
                "tmux": source.context(),
            }),
            CrawlerError::InvalidConfig { op, reason } => json!({
                "operation": op,
                "reason": reason,
            }),
            CrawlerError::Timeout {
                op,
                timeout,
                waiting_for,
                history,
            } => json!({
                "operation": op,
                "timeout_ms": timeout.as_millis() as u64,
                "waiting_for": waiting_for,
                "captures": history.iter().map(Screen::text).collect::<Vec<_>>(),
            }),
            CrawlerError::ProcessDied {
                op,
                status,
                waiting_for,
                history,
            } => json!({
                "operation": op,
                "status": status,
                "waiting_for": waiting_for,
                "captures": history.iter().map(Screen::text).collect::<Vec<_>>(),
            }),
            CrawlerError::ProcessExited { op, status } => json!({
                "operation": op,
                "status": status,
            }),
            CrawlerError::SnapshotMissing { path, .. } => json!({
                "operation": "snapshot",
                "path": path.display().to_string(),
            }),
            CrawlerError::SnapshotMismatch { name, path, .. } => json!({
                "operation": "snapshot",
                "name": name,
                "path": path.display().to_string(),
            }),
            CrawlerError::Io {
                op,
                action,
                path,
                source,
            } => json!({
                "operation": op,
                "action": action,
                "path": path.display().to_string(),
                "reason": source.to_string(),
            }),
        }
    }

    /// Returns a helpful suggestion for resolving the error.
    pub fn suggestion(&self) -> String {
        match self {
            CrawlerError::Environment { source, .. } | CrawlerError::Tmux { source, .. } => {
                source.suggestion()
            }
            CrawlerError::InvalidConfig { .. } => {
                "Use 0 to keep the session default; overrides must not be negative.".to_string()
            }
            CrawlerError::Timeout { .. } => {
                "Compare the captures above with the expectation, or raise the timeout."
                    .to_string()
            }
            CrawlerError::ProcessDied { .. } | CrawlerError::ProcessExited { .. } => {
                "The program under test exited. Check its output in the last capture.".to_string()
            }
            CrawlerError::SnapshotMissing { .. } | CrawlerError::SnapshotMismatch { .. } => {
                "Run with CRAWLER_UPDATE=1 to accept the current screen.".to_string()
            }
            CrawlerError::Io { .. } => "Check permissions on the snapshot directory.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CrawlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn screen(raw: &str, width: usize) -> Screen {
        Screen::from_capture(raw, width, 2)
    }

    #[test]
    fn test_timeout_message_shape() {
        let err = CrawlerError::Timeout {
            op: "wait-for",
            timeout: Duration::from_millis(150),
            waiting_for: Some("screen to contain \"never\"".to_string()),
            history: vec![screen("ab\n", 3)],
        };
        let msg = err.to_string();
        assert_eq!(
            msg,
            "crawler: wait-for: timed out after 150ms\n    \
             waiting for: screen to contain \"never\"\n    \
             recent screen captures (oldest to newest):\n    \
             capture 1/1:\n    \
             ┌───┐\n    \
             │ab │\n    \
             └───┘"
        );
        assert_eq!(err.operation(), "wait-for");
        assert!(!err.is_skip());
    }

    #[test]
    fn test_wait_exit_timeout_reports_pane_alive() {
        let err = CrawlerError::Timeout {
            op: "wait-exit",
            timeout: Duration::from_secs(5),
            waiting_for: None,
            history: Vec::new(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("crawler: wait-exit: timed out after 5s\n    pane still alive\n"));
        assert!(msg.ends_with("    (no screen captured)"));
    }

    #[test]
    fn test_process_died_message() {
        let err = CrawlerError::ProcessDied {
            op: "wait-for",
            status: 2,
            waiting_for: "matcher condition".to_string(),
            history: Vec::new(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("crawler: wait-for: process exited unexpectedly (status 2)\n"));
        assert!(msg.contains("    waiting for: matcher condition\n"));
        assert_eq!(err.exit_status(), Some(2));
        assert_eq!(err.context()["status"], 2);
    }

    #[test]
    fn test_skip_only_for_discovered_tmux() {
        let discovered = CrawlerError::Environment {
            op: "open",
            source: TmuxError::NotFound,
            explicit: false,
        };
        let explicit = CrawlerError::Environment {
            op: "open",
            source: TmuxError::TooOld {
                version: "2.9".into(),
                minimum: "3.0",
            },
            explicit: true,
        };
        assert!(discovered.is_skip());
        assert!(!explicit.is_skip());
        assert_eq!(discovered.to_string(), "crawler: open: tmux not found");
        assert!(explicit.suggestion().contains("3.0"));
    }

    #[test]
    fn test_snapshot_messages() {
        let missing = CrawlerError::SnapshotMissing {
            path: PathBuf::from("testdata/t/home.txt"),
            actual: "hello\n".into(),
        };
        assert!(missing.to_string().contains("golden file not found: testdata/t/home.txt"));
        assert!(missing.to_string().contains("CRAWLER_UPDATE=1"));
        assert_eq!(missing.operation(), "snapshot");

        let mismatch = CrawlerError::SnapshotMismatch {
            name: "home".into(),
            path: PathBuf::from("testdata/t/home.txt"),
            golden: "a\n".into(),
            actual: "b\n".into(),
        };
        let msg = mismatch.to_string();
        assert!(msg.contains("mismatch for \"home\""));
        assert!(msg.contains("--- golden ---\na\n\n--- actual ---\nb\n"));
    }

    #[test]
    fn test_context_includes_tmux_details() {
        let err = CrawlerError::Tmux {
            op: "capture",
            source: TmuxError::Parse {
                op: "list-panes".into(),
                output: "garbage".into(),
            },
        };
        let ctx = err.context();
        assert_eq!(ctx["operation"], "capture");
        assert_eq!(ctx["tmux"]["operation"], "list-panes");
        assert!(err.history().is_empty());
    }
}
