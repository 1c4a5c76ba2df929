//! The polling engine behind `wait_for` and `wait_exit`.
//!
//! One call resolves its timeout and poll interval, fixes a deadline, then
//! loops: query liveness, capture, evaluate, check the deadline, sleep. The
//! deadline is only checked after a full evaluation, so every wait captures
//! at least once.

use std::collections::VecDeque;
use std::time::Duration;

use crawler_core::{CursorPosition, Matcher, Screen};
use crawler_tmux::{ProcessHost, TmuxError};
use tracing::trace;

use crate::clock::Clock;
use crate::config::{MIN_POLL_INTERVAL, WaitOptions};
use crate::error::CrawlerError;
use crate::sleeper::Sleeper;

/// Screens kept for failure messages.
pub const FAILURE_CAPTURE_HISTORY: usize = 3;

/// Reported when the process died before the matcher ever saw a screen.
const UNEVALUATED: &str = "matcher condition";

const FALLBACK_BOX_WIDTH: usize = 80;

/// Effective timing for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPlan {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitPlan {
    /// Applies per-call overrides on top of session defaults.
    pub fn resolve(
        op: &'static str,
        opts: WaitOptions,
        default_timeout: Duration,
        default_poll_interval: Duration,
    ) -> Result<Self, CrawlerError> {
        if opts.timeout_ms < 0 {
            return Err(CrawlerError::InvalidConfig {
                op,
                reason: format!("negative timeout: {}ms", opts.timeout_ms),
            });
        }
        if opts.poll_interval_ms < 0 {
            return Err(CrawlerError::InvalidConfig {
                op,
                reason: format!("negative poll interval: {}ms", opts.poll_interval_ms),
            });
        }

        let timeout = match opts.timeout_ms {
            0 => default_timeout,
            ms => Duration::from_millis(ms.unsigned_abs()),
        };
        let poll_interval = match opts.poll_interval_ms {
            0 => default_poll_interval,
            ms => Duration::from_millis(ms.unsigned_abs()).max(MIN_POLL_INTERVAL),
        };
        Ok(Self {
            timeout,
            poll_interval,
        })
    }
}

/// Fixed-capacity capture history that evicts the oldest screen first.
#[derive(Debug)]
pub struct CaptureHistory {
    screens: VecDeque<Screen>,
    capacity: usize,
}

impl CaptureHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            screens: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, screen: Screen) {
        if self.capacity == 0 {
            return;
        }
        if self.screens.len() == self.capacity {
            self.screens.pop_front();
        }
        self.screens.push_back(screen);
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    /// Oldest to newest.
    pub fn into_vec(self) -> Vec<Screen> {
        self.screens.into()
    }
}

/// Terminal state of a wait loop.
#[derive(Debug)]
pub enum WaitOutcome<T> {
    Succeeded(T),
    TimedOut {
        /// `None` when there was no matcher to describe.
        last_description: Option<String>,
        history: Vec<Screen>,
    },
    ProcessDied {
        status: i32,
        last_description: String,
        history: Vec<Screen>,
    },
}

impl<T> WaitOutcome<T> {
    pub fn into_result(self, op: &'static str, timeout: Duration) -> Result<T, CrawlerError> {
        match self {
            WaitOutcome::Succeeded(value) => Ok(value),
            WaitOutcome::TimedOut {
                last_description,
                history,
            } => Err(CrawlerError::Timeout {
                op,
                timeout,
                waiting_for: last_description,
                history,
            }),
            WaitOutcome::ProcessDied {
                status,
                last_description,
                history,
            } => Err(CrawlerError::ProcessDied {
                op,
                status,
                waiting_for: last_description,
                history,
            }),
        }
    }
}

/// Drives one host with a given clock and sleeper.
pub struct Poller<'a> {
    host: &'a dyn ProcessHost,
    clock: &'a dyn Clock,
    sleeper: &'a dyn Sleeper,
    width: usize,
    height: usize,
}

impl<'a> Poller<'a> {
    pub fn new(
        host: &'a dyn ProcessHost,
        clock: &'a dyn Clock,
        sleeper: &'a dyn Sleeper,
        size: (u16, u16),
    ) -> Self {
        Self {
            host,
            clock,
            sleeper,
            width: usize::from(size.0),
            height: usize::from(size.1),
        }
    }

    /// Captures the visible pane. The cursor is best-effort.
    pub fn capture(&self) -> Result<Screen, TmuxError> {
        let raw = self.host.capture_pane()?;
        let screen = Screen::from_capture(&raw, self.width, self.height);
        match self.host.query_cursor() {
            Ok((row, col)) => Ok(screen.with_cursor(CursorPosition::new(row, col))),
            Err(err) => {
                trace!(error = %err, "cursor unavailable");
                Ok(screen)
            }
        }
    }

    /// Polls until `matcher` accepts a capture, the deadline passes, or the
    /// process dies. A failed liveness query, or a failed capture while the
    /// process is alive, aborts the wait.
    pub fn until_match(
        &self,
        matcher: &dyn Matcher,
        plan: WaitPlan,
    ) -> Result<WaitOutcome<Screen>, TmuxError> {
        let deadline = self.clock.now() + plan.timeout;
        let mut history = CaptureHistory::new(FAILURE_CAPTURE_HISTORY);
        let mut last_description = UNEVALUATED.to_string();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let state = self.host.query_liveness()?;
            if state.dead {
                // Death wins even if the final frame happens to match.
                if let Ok(screen) = self.capture() {
                    last_description = matcher.evaluate(&screen).description;
                    history.push(screen);
                }
                trace!(attempt, status = state.exit_status, "process died while waiting");
                return Ok(WaitOutcome::ProcessDied {
                    status: state.exit_status,
                    last_description,
                    history: history.into_vec(),
                });
            }

            let screen = self.capture()?;
            history.push(screen.clone());
            let outcome = matcher.evaluate(&screen);
            trace!(attempt, matched = outcome.matched, "poll");
            if outcome.matched {
                return Ok(WaitOutcome::Succeeded(screen));
            }
            last_description = outcome.description;

            if self.clock.now() > deadline {
                return Ok(WaitOutcome::TimedOut {
                    last_description: Some(last_description),
                    history: history.into_vec(),
                });
            }
            self.sleeper.sleep(plan.poll_interval);
        }
    }

    /// Polls until the process exits and returns its status. Captures taken
    /// along the way only feed the timeout message.
    pub fn until_exit(&self, plan: WaitPlan) -> Result<WaitOutcome<i32>, TmuxError> {
        let deadline = self.clock.now() + plan.timeout;
        let mut history = CaptureHistory::new(FAILURE_CAPTURE_HISTORY);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let state = self.host.query_liveness()?;
            trace!(attempt, dead = state.dead, "poll exit");
            if state.dead {
                return Ok(WaitOutcome::Succeeded(state.exit_status));
            }

            if let Ok(screen) = self.capture() {
                history.push(screen);
            }

            if self.clock.now() > deadline {
                return Ok(WaitOutcome::TimedOut {
                    last_description: None,
                    history: history.into_vec(),
                });
            }
            self.sleeper.sleep(plan.poll_interval);
        }
    }
}

/// Renders captures for a failure message, oldest first.
pub fn render_history(history: &[Screen]) -> String {
    if history.is_empty() {
        return "    (no screen captured)".to_string();
    }
    let total = history.len();
    history
        .iter()
        .enumerate()
        .map(|(i, screen)| format!("    capture {}/{}:\n{}", i + 1, total, render_box(screen)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_box(screen: &Screen) -> String {
    let width = match screen.size().0 {
        0 => FALLBACK_BOX_WIDTH,
        w => w,
    };
    let border = "─".repeat(width);

    let mut out = format!("    ┌{}┐\n", border);
    for line in screen.lines() {
        let pad = width.saturating_sub(line.chars().count());
        out.push_str(&format!("    │{}{}│\n", line, " ".repeat(pad)));
    }
    out.push_str(&format!("    └{}┘", border));
    out
}
