//! Screen captures and the matcher protocol for crawler.
//!
//! A [`Screen`] is one immutable capture of a terminal pane. A [`Matcher`] is a
//! pure predicate over a screen that also describes what it expected, so a
//! failed wait can finish the sentence "timed out waiting for ___".

#![deny(clippy::all)]

pub mod matcher;
pub mod screen;

#[cfg(test)]
pub mod test_fixtures;

pub use matcher::Matcher;
pub use matcher::Outcome;
pub use matcher::all;
pub use matcher::any;
pub use matcher::cursor;
pub use matcher::empty;
pub use matcher::line;
pub use matcher::line_contains;
pub use matcher::not;
pub use matcher::regexp;
pub use matcher::text;
pub use matcher::try_regexp;
pub use screen::CursorPosition;
pub use screen::Screen;
