use std::path::PathBuf;

use tracing::debug;

use crate::error::TmuxError;
use crate::runner::TmuxRunner;

/// Binary used to apply environment overrides inside the new session.
const ENV_WRAPPER: &str = "/usr/bin/env";

/// Liveness of the driven process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneState {
    pub dead: bool,
    pub exit_status: i32,
}

impl PaneState {
    pub fn alive() -> Self {
        Self {
            dead: false,
            exit_status: 0,
        }
    }

    pub fn exited(status: i32) -> Self {
        Self {
            dead: true,
            exit_status: status,
        }
    }
}

/// Pane-level operations against the host of one driven process.
///
/// Every method issues exactly one external command.
pub trait ProcessHost: Send {
    /// Visible pane content.
    fn capture_pane(&self) -> Result<String, TmuxError>;

    /// Full retained history, oldest to newest.
    fn capture_scrollback(&self) -> Result<String, TmuxError>;

    fn send_literal(&self, text: &str) -> Result<(), TmuxError>;

    fn send_keys(&self, keys: &[&str]) -> Result<(), TmuxError>;

    /// An exited process is a successful answer, not an error.
    fn query_liveness(&self) -> Result<PaneState, TmuxError>;

    /// Cursor as `(row, col)`, zero-indexed.
    fn query_cursor(&self) -> Result<(u16, u16), TmuxError>;

    fn resize(&self, width: u16, height: u16) -> Result<(), TmuxError>;

    /// Terminates the whole host session and everything in it.
    fn teardown(&self) -> Result<(), TmuxError>;
}

/// What to run in a new session.
#[derive(Debug, Clone, Default)]
pub struct SessionSpec {
    pub command: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
    /// `KEY=VALUE` entries visible from the first instruction of the program.
    pub env: Vec<String>,
    pub width: u16,
    pub height: u16,
}

impl SessionSpec {
    /// The argv handed to tmux after `--`.
    ///
    /// With overrides present the command runs through `env KEY=VALUE ...`
    /// so the variables exist before the binary starts.
    pub fn command_line(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.env.len() + self.args.len() + 2);
        if !self.env.is_empty() {
            argv.push(ENV_WRAPPER.to_string());
            argv.extend(self.env.iter().cloned());
        }
        argv.push(self.command.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

/// Launches `spec` in a new detached session on the runner's socket.
pub fn start_session(runner: &TmuxRunner, spec: &SessionSpec) -> Result<(), TmuxError> {
    let width = spec.width.to_string();
    let height = spec.height.to_string();
    let dir = spec.dir.as_ref().map(|d| d.display().to_string());
    let argv = spec.command_line();

    let mut args: Vec<&str> = vec![
        "new-session",
        "-d",
        "-x",
        width.as_str(),
        "-y",
        height.as_str(),
    ];
    if let Some(dir) = &dir {
        args.push("-c");
        args.push(dir);
    }
    args.push("--");
    args.extend(argv.iter().map(String::as_str));

    runner.run(&args)?;
    debug!(
        socket = %runner.socket_path().display(),
        command = %spec.command,
        width = spec.width,
        height = spec.height,
        "tmux session started"
    );
    Ok(())
}

/// Returns the id (e.g. `%0`) of the session's only pane.
pub fn resolve_pane(runner: &TmuxRunner) -> Result<String, TmuxError> {
    let output = runner.run(&["list-panes", "-F", "#{pane_id}"])?;
    let pane = output.lines().next().unwrap_or("").trim().to_string();
    if pane.is_empty() {
        return Err(TmuxError::Parse {
            op: "list-panes".to_string(),
            output,
        });
    }
    Ok(pane)
}

/// [`ProcessHost`] bound to one pane of one private tmux server.
#[derive(Debug)]
pub struct TmuxHost {
    runner: TmuxRunner,
    pane: String,
}

impl TmuxHost {
    pub fn new(runner: TmuxRunner, pane: impl Into<String>) -> Self {
        Self {
            runner,
            pane: pane.into(),
        }
    }

    pub fn pane(&self) -> &str {
        &self.pane
    }

    pub fn runner(&self) -> &TmuxRunner {
        &self.runner
    }
}

impl ProcessHost for TmuxHost {
    fn capture_pane(&self) -> Result<String, TmuxError> {
        self.runner.run(&["capture-pane", "-p", "-t", self.pane.as_str()])
    }

    fn capture_scrollback(&self) -> Result<String, TmuxError> {
        self.runner.run(&[
            "capture-pane",
            "-p",
            "-t",
            self.pane.as_str(),
            "-S",
            "-",
            "-E",
            "-",
        ])
    }

    fn send_literal(&self, text: &str) -> Result<(), TmuxError> {
        self.runner
            .run(&["send-keys", "-t", self.pane.as_str(), "-l", text])
            .map(drop)
    }

    fn send_keys(&self, keys: &[&str]) -> Result<(), TmuxError> {
        let mut args = vec!["send-keys", "-t", self.pane.as_str()];
        args.extend_from_slice(keys);
        self.runner.run(&args).map(drop)
    }

    fn query_liveness(&self) -> Result<PaneState, TmuxError> {
        let output = self.runner.run(&[
            "list-panes",
            "-t",
            self.pane.as_str(),
            "-F",
            "#{pane_dead} #{pane_dead_status}",
        ])?;
        parse_pane_state(&output)
    }

    fn query_cursor(&self) -> Result<(u16, u16), TmuxError> {
        let output = self.runner.run(&[
            "display-message",
            "-p",
            "-t",
            self.pane.as_str(),
            "#{cursor_x} #{cursor_y}",
        ])?;
        parse_cursor(&output)
    }

    fn resize(&self, width: u16, height: u16) -> Result<(), TmuxError> {
        let width = width.to_string();
        let height = height.to_string();
        self.runner
            .run(&[
                "resize-window",
                "-t",
                self.pane.as_str(),
                "-x",
                width.as_str(),
                "-y",
                height.as_str(),
            ])
            .map(drop)
    }

    fn teardown(&self) -> Result<(), TmuxError> {
        self.runner.run(&["kill-server"]).map(drop)
    }
}

/// Parses `#{pane_dead} #{pane_dead_status}`.
///
/// A missing or unparsable status on a dead pane reads as 0.
fn parse_pane_state(output: &str) -> Result<PaneState, TmuxError> {
    let first = output.lines().next().unwrap_or("").trim();
    let mut parts = first.splitn(2, ' ');
    let dead = match parts.next() {
        Some("1") => true,
        Some("0") => false,
        _ => {
            return Err(TmuxError::Parse {
                op: "list-panes".to_string(),
                output: output.to_string(),
            });
        }
    };
    if !dead {
        return Ok(PaneState::alive());
    }
    let status = parts
        .next()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0);
    Ok(PaneState::exited(status))
}

/// Parses `#{cursor_x} #{cursor_y}` into `(row, col)`.
fn parse_cursor(output: &str) -> Result<(u16, u16), TmuxError> {
    let parse_err = || TmuxError::Parse {
        op: "display-message".to_string(),
        output: output.to_string(),
    };
    let line = output.trim();
    let (x, y) = line.split_once(' ').ok_or_else(parse_err)?;
    let col = x.trim().parse().map_err(|_| parse_err())?;
    let row = y.trim().parse().map_err(|_| parse_err())?;
    Ok((row, col))
}
