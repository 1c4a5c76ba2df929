//! tmux errors with structured context.
//!
//! A command failure keeps the sub-command name, the full argument vector and
//! trimmed stderr so the caller can tell exactly which invocation went wrong.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::{Value, json};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TmuxError {
    #[error("tmux {op} failed: {reason}{}", stderr_suffix(.stderr))]
    Command {
        op: String,
        args: Vec<String>,
        stderr: String,
        reason: String,
        #[source]
        source: Option<io::Error>,
    },
    #[error("unexpected tmux {op} output: {output:?}")]
    Parse { op: String, output: String },
    #[error("tmux not found")]
    NotFound,
    #[error("tmux -V failed: {reason}")]
    Version { reason: String },
    #[error("tmux version {version} is below minimum {minimum}")]
    TooOld {
        version: String,
        minimum: &'static str,
    },
    #[error("tmux session not ready after {timeout:?}: {last}")]
    NotReady {
        timeout: Duration,
        #[source]
        last: Box<TmuxError>,
    },
    #[error("failed to write tmux config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not generate unique socket path after {attempts} attempts")]
    SocketPath { attempts: usize },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\nstderr: {}", stderr)
    }
}

impl TmuxError {
    /// The tmux sub-command (or setup step) that failed.
    pub fn operation(&self) -> &str {
        match self {
            TmuxError::Command { op, .. } | TmuxError::Parse { op, .. } => op,
            TmuxError::NotFound => "lookup",
            TmuxError::Version { .. } | TmuxError::TooOld { .. } => "version",
            TmuxError::NotReady { .. } => "wait-ready",
            TmuxError::Config { .. } => "config",
            TmuxError::SocketPath { .. } => "socket",
        }
    }

    /// Returns structured context about the error for debugging.
    pub fn context(&self) -> Value {
        match self {
            TmuxError::Command {
                op, args, stderr, reason, ..
            } => json!({
                "operation": op,
                "args": args,
                "stderr": stderr,
                "reason": reason,
            }),
            TmuxError::Parse { op, output } => json!({
                "operation": op,
                "output": output,
            }),
            TmuxError::NotFound => json!({ "operation": "lookup" }),
            TmuxError::Version { reason } => json!({
                "operation": "version",
                "reason": reason,
            }),
            TmuxError::TooOld { version, minimum } => json!({
                "operation": "version",
                "version": version,
                "minimum": minimum,
            }),
            TmuxError::NotReady { timeout, last } => json!({
                "operation": "wait-ready",
                "timeout_ms": timeout.as_millis() as u64,
                "last": last.context(),
            }),
            TmuxError::Config { path, source } => json!({
                "operation": "config",
                "path": path.display().to_string(),
                "reason": source.to_string(),
            }),
            TmuxError::SocketPath { attempts } => json!({
                "operation": "socket",
                "attempts": attempts,
            }),
        }
    }

    /// Returns a helpful suggestion for resolving the error.
    pub fn suggestion(&self) -> String {
        match self {
            TmuxError::NotFound => {
                "Install tmux 3.0+ or point CRAWLER_TMUX at the binary.".to_string()
            }
            TmuxError::Version { .. } | TmuxError::TooOld { .. } => {
                "crawler needs tmux 3.0 or newer. Check `tmux -V`.".to_string()
            }
            TmuxError::Command { stderr, .. } if stderr.contains("no server running") => {
                "The tmux server is gone; the session was torn down or never started.".to_string()
            }
            TmuxError::Command { source: Some(_), .. } => {
                "tmux could not be executed. Check the binary path and permissions.".to_string()
            }
            TmuxError::Command { .. } | TmuxError::Parse { .. } => {
                "Run with RUST_LOG=crawler=debug to see every tmux invocation.".to_string()
            }
            TmuxError::NotReady { .. } => {
                "The session did not come up. Check that the command exists and starts cleanly."
                    .to_string()
            }
            TmuxError::Config { .. } | TmuxError::SocketPath { .. } => {
                "Check that the temporary directory is writable.".to_string()
            }
        }
    }

    /// Returns whether this error is potentially transient and may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TmuxError::Command { source: None, .. })
    }
}
