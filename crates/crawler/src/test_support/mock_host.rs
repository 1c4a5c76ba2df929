use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use crawler_common::mutex_lock_or_recover;
use crawler_tmux::{PaneState, ProcessHost, TmuxError};

/// Input the host received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Literal(String),
    Keys(Vec<String>),
}

/// Scripted [`ProcessHost`]. Clones share state, so a test can keep one
/// handle while a `Terminal` owns another.
///
/// Scripted captures and liveness answers are consumed one per call; once a
/// script runs out the last answer repeats.
#[derive(Debug, Clone, Default)]
pub struct MockHost {
    state: Arc<Mutex<HostState>>,
}

#[derive(Debug, Default)]
struct HostState {
    captures: VecDeque<String>,
    last_capture: String,
    capture_fails: bool,
    scrollback: String,
    liveness: VecDeque<PaneState>,
    last_liveness: Option<PaneState>,
    liveness_fails: bool,
    cursor: Option<(u16, u16)>,
    capture_count: usize,
    liveness_count: usize,
    sent: Vec<Sent>,
    resizes: Vec<(u16, u16)>,
    teardowns: usize,
}

fn failure(op: &str) -> TmuxError {
    TmuxError::Command {
        op: op.to_string(),
        args: vec![op.to_string()],
        stderr: "scripted failure".to_string(),
        reason: "exit status: 1".to_string(),
        source: None,
    }
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_captures<I, S>(self, captures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock()
            .captures
            .extend(captures.into_iter().map(Into::into));
        self
    }

    pub fn with_liveness(self, states: impl IntoIterator<Item = PaneState>) -> Self {
        self.lock().liveness.extend(states);
        self
    }

    pub fn with_cursor(self, row: u16, col: u16) -> Self {
        self.lock().cursor = Some((row, col));
        self
    }

    pub fn with_scrollback(self, raw: impl Into<String>) -> Self {
        self.lock().scrollback = raw.into();
        self
    }

    pub fn failing_captures(self) -> Self {
        self.lock().capture_fails = true;
        self
    }

    pub fn failing_liveness(self) -> Self {
        self.lock().liveness_fails = true;
        self
    }

    /// Makes every later liveness query report an exit with `status`.
    pub fn exit(&self, status: i32) {
        let mut state = self.lock();
        state.liveness.clear();
        state.last_liveness = Some(PaneState::exited(status));
    }

    pub fn capture_count(&self) -> usize {
        self.lock().capture_count
    }

    pub fn liveness_count(&self) -> usize {
        self.lock().liveness_count
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.lock().sent.clone()
    }

    pub fn resizes(&self) -> Vec<(u16, u16)> {
        self.lock().resizes.clone()
    }

    pub fn teardowns(&self) -> usize {
        self.lock().teardowns
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HostState> {
        mutex_lock_or_recover(&self.state)
    }
}

impl ProcessHost for MockHost {
    fn capture_pane(&self) -> Result<String, TmuxError> {
        let mut state = self.lock();
        state.capture_count += 1;
        if state.capture_fails {
            return Err(failure("capture-pane"));
        }
        if let Some(next) = state.captures.pop_front() {
            state.last_capture = next;
        }
        Ok(state.last_capture.clone())
    }

    fn capture_scrollback(&self) -> Result<String, TmuxError> {
        let state = self.lock();
        if state.capture_fails {
            return Err(failure("capture-pane"));
        }
        Ok(state.scrollback.clone())
    }

    fn send_literal(&self, text: &str) -> Result<(), TmuxError> {
        self.lock().sent.push(Sent::Literal(text.to_string()));
        Ok(())
    }

    fn send_keys(&self, keys: &[&str]) -> Result<(), TmuxError> {
        let keys = keys.iter().map(|k| k.to_string()).collect();
        self.lock().sent.push(Sent::Keys(keys));
        Ok(())
    }

    fn query_liveness(&self) -> Result<PaneState, TmuxError> {
        let mut state = self.lock();
        state.liveness_count += 1;
        if state.liveness_fails {
            return Err(failure("list-panes"));
        }
        if let Some(next) = state.liveness.pop_front() {
            state.last_liveness = Some(next);
        }
        Ok(state.last_liveness.unwrap_or_else(PaneState::alive))
    }

    fn query_cursor(&self) -> Result<(u16, u16), TmuxError> {
        self.lock()
            .cursor
            .ok_or_else(|| failure("display-message"))
    }

    fn resize(&self, width: u16, height: u16) -> Result<(), TmuxError> {
        self.lock().resizes.push((width, height));
        Ok(())
    }

    fn teardown(&self) -> Result<(), TmuxError> {
        self.lock().teardowns += 1;
        Ok(())
    }
}
