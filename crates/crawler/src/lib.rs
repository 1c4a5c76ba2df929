//! Black-box testing for terminal programs.
//!
//! crawler runs the program under test inside a private tmux server, types
//! into it and polls the rendered screen until a [`Matcher`] is satisfied:
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use crawler::{Key, OrFail, TerminalConfig, WaitOptions, text};
//!
//! let config = TerminalConfig::default().with_args(["--color=never"]);
//! let term = crawler::Terminal::open("/usr/local/bin/my-tui", config).or_fail();
//!
//! term.wait_for(text("ready>")).or_fail();
//! term.type_text("hello").or_fail();
//! term.press(&[Key::Enter]).or_fail();
//! term.wait_for_with(text("echo: hello"), WaitOptions::within(Duration::from_secs(2)))
//!     .or_fail();
//! ```
//!
//! A failed wait reports what it was waiting for along with the last few
//! screens it saw.

#![deny(clippy::all)]

pub mod clock;
pub mod config;
pub mod error;
pub mod harness;
pub mod keys;
pub mod sleeper;
pub mod snapshot;
pub mod telemetry;
pub mod terminal;
pub mod wait;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::TerminalConfig;
pub use config::WaitOptions;
pub use error::CrawlerError;
pub use error::Result;
pub use harness::OrFail;
pub use keys::Key;
pub use snapshot::SnapshotStore;
pub use snapshot::assert_snapshot;
pub use snapshot::normalize_for_snapshot;
pub use terminal::Terminal;

pub use crawler_core::CursorPosition;
pub use crawler_core::Matcher;
pub use crawler_core::Outcome;
pub use crawler_core::Screen;
pub use crawler_core::all;
pub use crawler_core::any;
pub use crawler_core::cursor;
pub use crawler_core::empty;
pub use crawler_core::line;
pub use crawler_core::line_contains;
pub use crawler_core::not;
pub use crawler_core::regexp;
pub use crawler_core::text;
pub use crawler_core::try_regexp;
