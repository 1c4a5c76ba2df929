#![allow(dead_code)]

use std::sync::OnceLock;
use std::time::Duration;

use crawler::TerminalConfig;
use crawler::telemetry::{TelemetryGuard, init_tracing};

/// Path of the fixture program built alongside these tests.
pub fn testbin() -> &'static str {
    env!("CARGO_BIN_EXE_crawler-testbin")
}

/// Installs logging once per test binary.
pub fn init() {
    static GUARD: OnceLock<TelemetryGuard> = OnceLock::new();
    GUARD.get_or_init(init_tracing);
}

/// Session defaults for the fixture. CI machines can be slow to start tmux.
pub fn config() -> TerminalConfig {
    init();
    TerminalConfig::default().with_timeout(Duration::from_secs(10))
}
