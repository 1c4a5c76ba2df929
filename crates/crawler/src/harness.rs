//! Turning crawler results into test outcomes.
//!
//! Library calls return [`Result`]; tests usually want "fail right here" or
//! "skip when tmux is unavailable". [`OrFail`] and [`open_or_skip!`] do that.

use crate::config::TerminalConfig;
use crate::error::{CrawlerError, Result};
use crate::terminal::Terminal;

/// Unwraps a crawler result, failing the test at the caller's line.
pub trait OrFail<T> {
    fn or_fail(self) -> T;
}

impl<T> OrFail<T> for Result<T> {
    #[track_caller]
    fn or_fail(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => fail(err),
        }
    }
}

#[track_caller]
fn fail(err: CrawlerError) -> ! {
    panic!("{}", err)
}

/// Opens a terminal, or returns `None` when the environment cannot run it.
///
/// Only problems with an auto-discovered tmux skip. Every other error fails
/// the test.
#[track_caller]
pub fn open_or_skip(binary: impl Into<String>, config: TerminalConfig) -> Option<Terminal> {
    match Terminal::open(binary, config) {
        Ok(terminal) => Some(terminal),
        Err(err) if err.is_skip() => {
            tracing::warn!(error = %err, "skipping test");
            eprintln!("skipping: {}", err);
            None
        }
        Err(err) => fail(err),
    }
}

/// Opens a terminal or returns from the enclosing test when tmux is
/// unavailable.
///
/// ```no_run
/// use crawler::{open_or_skip, text, OrFail};
///
/// fn my_test() {
///     let term = open_or_skip!("/bin/cat");
///     term.type_text("hi").or_fail();
///     term.wait_for(text("hi")).or_fail();
/// }
/// ```
#[macro_export]
macro_rules! open_or_skip {
    ($binary:expr) => {
        $crate::open_or_skip!($binary, $crate::TerminalConfig::default())
    };
    ($binary:expr, $config:expr) => {
        match $crate::harness::open_or_skip($binary, $config) {
            Some(terminal) => terminal,
            None => return,
        }
    };
}
