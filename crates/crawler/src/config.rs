use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crawler_tmux::socket::DEFAULT_HISTORY_LIMIT;

pub const DEFAULT_WIDTH: u16 = 80;
pub const DEFAULT_HEIGHT: u16 = 24;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Smallest poll interval a per-call override may request.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long `open` waits for a fresh tmux server to answer.
pub const READY_TIMEOUT: Duration = Duration::from_secs(5);

const FALLBACK_TEST_NAME: &str = "crawler";

/// Session-wide settings for one [`Terminal`](crate::Terminal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalConfig {
    pub args: Vec<String>,
    pub width: u16,
    pub height: u16,
    /// `KEY=VALUE` entries applied before the binary starts.
    pub env: Vec<String>,
    pub dir: Option<PathBuf>,
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Explicit tmux binary. Failures against an explicit path are never skips.
    pub tmux_path: Option<PathBuf>,
    /// Scrollback lines retained by tmux. 0 means the default.
    pub history_limit: u32,
    pub test_name: Option<String>,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            env: Vec::new(),
            dir: None,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            tmux_path: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            test_name: None,
        }
    }
}

impl TerminalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_size(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Appends to any entries already set.
    pub fn with_env<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env.extend(entries.into_iter().map(Into::into));
        self
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_tmux_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tmux_path = Some(path.into());
        self
    }

    pub fn with_history_limit(mut self, limit: u32) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_test_name(mut self, name: impl Into<String>) -> Self {
        self.test_name = Some(name.into());
        self
    }

    /// The configured name, else the current thread's name. The libtest
    /// harness names each test thread after the test path.
    pub fn resolved_test_name(&self) -> String {
        if let Some(name) = &self.test_name {
            return name.clone();
        }
        thread::current()
            .name()
            .filter(|name| *name != "main")
            .unwrap_or(FALLBACK_TEST_NAME)
            .to_string()
    }
}

/// Per-call overrides for a single wait, in signed milliseconds.
///
/// `0` keeps the session default and a negative value is rejected before any
/// polling happens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaitOptions {
    pub timeout_ms: i64,
    pub poll_interval_ms: i64,
}

impl WaitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides only the timeout.
    pub fn within(timeout: Duration) -> Self {
        Self::default().with_timeout_ms(duration_ms(timeout))
    }

    pub fn with_timeout_ms(mut self, ms: i64) -> Self {
        self.timeout_ms = ms;
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: i64) -> Self {
        self.poll_interval_ms = ms;
        self
    }
}

fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
