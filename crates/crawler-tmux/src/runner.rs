use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::TmuxError;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Executes tmux commands against one private server socket.
#[derive(Debug, Clone)]
pub struct TmuxRunner {
    tmux_path: PathBuf,
    socket_path: PathBuf,
    config_path: Option<PathBuf>,
}

impl TmuxRunner {
    pub fn new(tmux_path: impl Into<PathBuf>, socket_path: impl Into<PathBuf>) -> Self {
        Self {
            tmux_path: tmux_path.into(),
            socket_path: socket_path.into(),
            config_path: None,
        }
    }

    /// Every later invocation passes `-f <path>` ahead of the socket flag.
    pub fn set_config_path(&mut self, path: impl Into<PathBuf>) {
        self.config_path = Some(path.into());
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn tmux_path(&self) -> &Path {
        &self.tmux_path
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    fn full_args(&self, args: &[&str]) -> Vec<String> {
        let mut full = Vec::with_capacity(args.len() + 4);
        if let Some(config) = &self.config_path {
            full.push("-f".to_string());
            full.push(config.display().to_string());
        }
        full.push("-S".to_string());
        full.push(self.socket_path.display().to_string());
        full.extend(args.iter().map(|a| a.to_string()));
        full
    }

    /// Runs one tmux command and returns its stdout.
    ///
    /// A non-zero exit becomes [`TmuxError::Command`] carrying trimmed stderr.
    pub fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        let op = args.first().copied().unwrap_or("tmux").to_string();
        let full = self.full_args(args);
        trace!(op = %op, args = ?full, "tmux");

        let output = Command::new(&self.tmux_path)
            .args(&full)
            .output()
            .map_err(|err| TmuxError::Command {
                op: op.clone(),
                args: full.clone(),
                stderr: String::new(),
                reason: err.to_string(),
                source: Some(err),
            })?;

        check_output(op, full, output)
    }

    /// Polls `list-panes` until the server answers or `timeout` elapses.
    pub fn wait_for_session(&self, timeout: Duration) -> Result<(), TmuxError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.run(&["list-panes", "-F", "#{pane_id}"]) {
                Ok(_) => {
                    debug!(socket = %self.socket_path.display(), "tmux session ready");
                    return Ok(());
                }
                Err(err) if Instant::now() > deadline => {
                    return Err(TmuxError::NotReady {
                        timeout,
                        last: Box::new(err),
                    });
                }
                Err(_) => thread::sleep(READY_POLL_INTERVAL),
            }
        }
    }
}

fn check_output(op: String, args: Vec<String>, output: Output) -> Result<String, TmuxError> {
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }
    Err(TmuxError::Command {
        op,
        args,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        reason: output.status.to_string(),
        source: None,
    })
}

/// Runs `tmux -V` and returns the version, e.g. `3.4` or `next-3.5`.
pub fn version(tmux_path: &Path) -> Result<String, TmuxError> {
    let output = Command::new(tmux_path)
        .arg("-V")
        .output()
        .map_err(|err| TmuxError::Version {
            reason: err.to_string(),
        })?;

    if !output.status.success() {
        return Err(TmuxError::Version {
            reason: format!(
                "{} (stderr: {})",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let trimmed = stdout.trim();
    Ok(trimmed.strip_prefix("tmux ").unwrap_or(trimmed).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_args_without_config() {
        let runner = TmuxRunner::new("tmux", "/tmp/a.sock");
        assert_eq!(
            runner.full_args(&["list-panes"]),
            vec!["-S", "/tmp/a.sock", "list-panes"]
        );
    }

    #[test]
    fn test_full_args_puts_config_first() {
        let mut runner = TmuxRunner::new("tmux", "/tmp/a.sock");
        runner.set_config_path("/tmp/a.sock.conf");
        assert_eq!(
            runner.full_args(&["kill-server"]),
            vec!["-f", "/tmp/a.sock.conf", "-S", "/tmp/a.sock", "kill-server"]
        );
        assert_eq!(runner.config_path(), Some(Path::new("/tmp/a.sock.conf")));
    }

    #[test]
    fn test_run_missing_binary_is_command_error_with_source() {
        let runner = TmuxRunner::new("/nonexistent/crawler-tmux-binary", "/tmp/a.sock");
        let err = runner.run(&["list-panes"]).unwrap_err();
        match err {
            TmuxError::Command { op, source, .. } => {
                assert_eq!(op, "list-panes");
                assert!(source.is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_version_missing_binary() {
        let err = version(Path::new("/nonexistent/crawler-tmux-binary")).unwrap_err();
        assert!(matches!(err, TmuxError::Version { .. }));
    }
}
