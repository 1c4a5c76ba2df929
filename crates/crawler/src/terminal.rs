//! A program under test running in its own tmux server.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crawler_core::{Matcher, Screen};
use crawler_tmux::socket;
use crawler_tmux::{
    ProcessHost, SessionSpec, TmuxError, TmuxHost, TmuxRunner, check_version, resolve_pane,
    resolve_tmux_path, start_session,
};
use tracing::{debug, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{READY_TIMEOUT, TerminalConfig, WaitOptions};
use crate::error::{CrawlerError, Result};
use crate::keys::Key;
use crate::sleeper::{RealSleeper, Sleeper};
use crate::snapshot::SnapshotStore;
use crate::wait::{Poller, WaitPlan};

const OP_OPEN: &str = "open";
const OP_SEND_KEYS: &str = "send-keys";
const OP_CAPTURE: &str = "capture";
const OP_WAIT_FOR: &str = "wait-for";
const OP_WAIT_EXIT: &str = "wait-exit";
const OP_RESIZE: &str = "resize";
const OP_CLOSE: &str = "close";

/// Handle to one driven process.
///
/// Every operation goes to this session's private tmux server, so terminals
/// opened by parallel tests never see each other. The server is killed
/// exactly once, by [`Terminal::close`] or on drop.
pub struct Terminal {
    host: Box<dyn ProcessHost>,
    config: TerminalConfig,
    test_name: String,
    clock: Box<dyn Clock>,
    sleeper: Box<dyn Sleeper>,
    config_file: Option<PathBuf>,
    torn_down: bool,
}

impl Terminal {
    /// Starts `binary` in a fresh tmux server and waits until it is usable.
    ///
    /// A missing or too-old tmux is an [`CrawlerError::Environment`] error;
    /// [`CrawlerError::is_skip`] tells whether the test should skip.
    pub fn open(binary: impl Into<String>, config: TerminalConfig) -> Result<Self> {
        let tmux = resolve_tmux_path(config.tmux_path.as_deref()).map_err(|source| {
            CrawlerError::Environment {
                op: OP_OPEN,
                source,
                explicit: false,
            }
        })?;
        let version = check_version(&tmux.path).map_err(|source| CrawlerError::Environment {
            op: OP_OPEN,
            source,
            explicit: tmux.explicit,
        })?;

        let test_name = config.resolved_test_name();
        let socket_path =
            socket::generate_socket_path(&test_name).map_err(CrawlerError::tmux(OP_OPEN))?;
        let config_file = socket::config_path_for(&socket_path);
        socket::write_config(&config_file, config.history_limit)
            .map_err(CrawlerError::tmux(OP_OPEN))?;

        let mut runner = TmuxRunner::new(&tmux.path, &socket_path);
        runner.set_config_path(&config_file);

        let spec = SessionSpec {
            command: binary.into(),
            args: config.args.clone(),
            dir: config.dir.clone(),
            env: config.env.clone(),
            width: config.width,
            height: config.height,
        };

        let pane = match launch(&runner, &spec) {
            Ok(pane) => pane,
            Err(source) => {
                if let Err(err) = runner.run(&["kill-server"]) {
                    trace!(error = %err, "no server to kill after failed start");
                }
                remove_file_if_present(&config_file).ok();
                return Err(CrawlerError::Tmux {
                    op: OP_OPEN,
                    source,
                });
            }
        };

        debug!(
            test = %test_name,
            tmux = %tmux.path.display(),
            %version,
            socket = %socket_path.display(),
            %pane,
            "terminal opened"
        );

        let mut terminal = Self::from_host(Box::new(TmuxHost::new(runner, pane)), config);
        terminal.test_name = test_name;
        terminal.config_file = Some(config_file);
        Ok(terminal)
    }

    /// Wraps an already running host. Nothing is launched.
    pub fn from_host(host: Box<dyn ProcessHost>, config: TerminalConfig) -> Self {
        Self::with_timing(host, config, Box::new(SystemClock), Box::new(RealSleeper))
    }

    pub(crate) fn with_timing(
        host: Box<dyn ProcessHost>,
        config: TerminalConfig,
        clock: Box<dyn Clock>,
        sleeper: Box<dyn Sleeper>,
    ) -> Self {
        let test_name = config.resolved_test_name();
        Self {
            host,
            config,
            test_name,
            clock,
            sleeper,
            config_file: None,
            torn_down: false,
        }
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    /// Declared `(width, height)` used for new captures.
    pub fn size(&self) -> (u16, u16) {
        (self.config.width, self.config.height)
    }

    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Sends raw tmux key names such as `Enter` or `C-c`.
    pub fn send_keys(&self, keys: &[&str]) -> Result<()> {
        self.require_alive(OP_SEND_KEYS)?;
        self.host
            .send_keys(keys)
            .map_err(CrawlerError::tmux(OP_SEND_KEYS))
    }

    /// Types `text` literally; no key-name lookup happens.
    pub fn type_text(&self, text: &str) -> Result<()> {
        self.require_alive(OP_SEND_KEYS)?;
        self.host
            .send_literal(text)
            .map_err(CrawlerError::tmux(OP_SEND_KEYS))
    }

    pub fn press(&self, keys: &[Key]) -> Result<()> {
        let names: Vec<String> = keys.iter().map(Key::tmux_name).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        self.send_keys(&names)
    }

    /// Captures the visible pane.
    pub fn screen(&self) -> Result<Screen> {
        self.require_alive(OP_CAPTURE)?;
        self.poller()
            .capture()
            .map_err(CrawlerError::tmux(OP_CAPTURE))
    }

    /// Captures the whole retained history. The screen is as tall as the
    /// number of lines and as wide as the longest one.
    pub fn scrollback(&self) -> Result<Screen> {
        self.require_alive(OP_CAPTURE)?;
        let raw = self
            .host
            .capture_scrollback()
            .map_err(CrawlerError::tmux(OP_CAPTURE))?;

        let text = raw.replace("\r\n", "\n");
        let body = text.strip_suffix('\n').unwrap_or(&text);
        let height = body.split('\n').count();
        let width = body
            .split('\n')
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        Ok(Screen::from_capture(&raw, width, height))
    }

    /// Resizes the pane. Later captures report the new size.
    pub fn resize(&mut self, width: u16, height: u16) -> Result<()> {
        self.require_alive(OP_RESIZE)?;
        self.host
            .resize(width, height)
            .map_err(CrawlerError::tmux(OP_RESIZE))?;
        self.config.width = width;
        self.config.height = height;
        debug!(width, height, "terminal resized");
        Ok(())
    }

    /// Waits with the session's timeout and poll interval.
    pub fn wait_for(&self, matcher: impl Matcher) -> Result<()> {
        self.wait_for_screen_with(matcher, WaitOptions::default())
            .map(|_| ())
    }

    pub fn wait_for_with(&self, matcher: impl Matcher, opts: WaitOptions) -> Result<()> {
        self.wait_for_screen_with(matcher, opts).map(|_| ())
    }

    /// Like [`Terminal::wait_for`] but returns the matching screen.
    pub fn wait_for_screen(&self, matcher: impl Matcher) -> Result<Screen> {
        self.wait_for_screen_with(matcher, WaitOptions::default())
    }

    #[tracing::instrument(
        skip_all,
        fields(
            test = %self.test_name,
            timeout_ms = opts.timeout_ms,
            poll_interval_ms = opts.poll_interval_ms
        )
    )]
    pub fn wait_for_screen_with(&self, matcher: impl Matcher, opts: WaitOptions) -> Result<Screen> {
        let plan = WaitPlan::resolve(
            OP_WAIT_FOR,
            opts,
            self.config.timeout,
            self.config.poll_interval,
        )?;
        self.poller()
            .until_match(&matcher, plan)
            .map_err(CrawlerError::tmux(OP_WAIT_FOR))?
            .into_result(OP_WAIT_FOR, plan.timeout)
    }

    /// Waits for the process to exit and returns its status.
    pub fn wait_exit(&self) -> Result<i32> {
        self.wait_exit_with(WaitOptions::default())
    }

    #[tracing::instrument(
        skip_all,
        fields(
            test = %self.test_name,
            timeout_ms = opts.timeout_ms,
            poll_interval_ms = opts.poll_interval_ms
        )
    )]
    pub fn wait_exit_with(&self, opts: WaitOptions) -> Result<i32> {
        let plan = WaitPlan::resolve(
            OP_WAIT_EXIT,
            opts,
            self.config.timeout,
            self.config.poll_interval,
        )?;
        self.poller()
            .until_exit(plan)
            .map_err(CrawlerError::tmux(OP_WAIT_EXIT))?
            .into_result(OP_WAIT_EXIT, plan.timeout)
    }

    /// Compares the current screen with the golden file `name`.
    pub fn match_snapshot(&self, name: &str) -> Result<()> {
        let screen = self.screen()?;
        SnapshotStore::from_env().assert_matches(&self.test_name, name, &screen)
    }

    /// Tears the session down now and reports any failure.
    pub fn close(mut self) -> Result<()> {
        self.teardown()
    }

    fn poller(&self) -> Poller<'_> {
        Poller::new(
            self.host.as_ref(),
            self.clock.as_ref(),
            self.sleeper.as_ref(),
            self.size(),
        )
    }

    /// A dead process fails the operation. An unanswered liveness query does
    /// not; the operation itself will report the real problem.
    fn require_alive(&self, op: &'static str) -> Result<()> {
        match self.host.query_liveness() {
            Ok(state) if state.dead => Err(CrawlerError::ProcessExited {
                op,
                status: state.exit_status,
            }),
            Ok(_) => Ok(()),
            Err(err) => {
                trace!(op, error = %err, "liveness check skipped");
                Ok(())
            }
        }
    }

    fn teardown(&mut self) -> Result<()> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;

        let killed = self.host.teardown().map_err(CrawlerError::tmux(OP_CLOSE));
        let removed = match self.config_file.take() {
            Some(path) => remove_file_if_present(&path).map_err(|source| CrawlerError::Io {
                op: OP_CLOSE,
                action: "remove",
                path,
                source,
            }),
            None => Ok(()),
        };
        debug!(test = %self.test_name, "terminal closed");
        killed.and(removed)
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if let Err(err) = self.teardown() {
            warn!(test = %self.test_name, error = %err, "teardown failed");
        }
    }
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal")
            .field("test_name", &self.test_name)
            .field("config", &self.config)
            .field("config_file", &self.config_file)
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}

fn launch(runner: &TmuxRunner, spec: &SessionSpec) -> std::result::Result<String, TmuxError> {
    start_session(runner, spec)?;
    runner.wait_for_session(READY_TIMEOUT)?;
    resolve_pane(runner)
}

fn remove_file_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}
