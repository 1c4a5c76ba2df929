//! The matcher protocol and the built-in matchers.
//!
//! Every evaluation yields a description, matched or not, and the description
//! for a fixed screen never changes between calls. Wait failures quote it
//! verbatim.

use std::fmt;

use crate::screen::Screen;

/// Result of evaluating a [`Matcher`] against a [`Screen`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub matched: bool,
    pub description: String,
}

impl Outcome {
    pub fn new(matched: bool, description: impl Into<String>) -> Self {
        Self {
            matched,
            description: description.into(),
        }
    }
}

/// A predicate over a screen that explains what it expected.
pub trait Matcher: Send + Sync {
    fn evaluate(&self, screen: &Screen) -> Outcome;

    fn boxed(self) -> Box<dyn Matcher>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

impl<M: Matcher + ?Sized> Matcher for Box<M> {
    fn evaluate(&self, screen: &Screen) -> Outcome {
        (**self).evaluate(screen)
    }
}

impl<M: Matcher + ?Sized> Matcher for &M {
    fn evaluate(&self, screen: &Screen) -> Outcome {
        (**self).evaluate(screen)
    }
}

/// Adapts a closure returning `(matched, description)`.
pub struct FnMatcher<F>(F);

impl<F> Matcher for FnMatcher<F>
where
    F: Fn(&Screen) -> (bool, String) + Send + Sync,
{
    fn evaluate(&self, screen: &Screen) -> Outcome {
        let (matched, description) = (self.0)(screen);
        Outcome::new(matched, description)
    }
}

/// Builds a matcher from a closure.
///
/// ```
/// use crawler_core::matcher::from_fn;
///
/// let _first_row_blank = from_fn(|screen| {
///     (screen.get_line(0).is_some_and(|l| l.trim().is_empty()), "line 0 to be blank".to_string())
/// });
/// ```
pub fn from_fn<F>(f: F) -> FnMatcher<F>
where
    F: Fn(&Screen) -> (bool, String) + Send + Sync,
{
    FnMatcher(f)
}

#[derive(Debug, Clone)]
pub struct Text(String);

/// Matches when the screen contains `needle` anywhere.
pub fn text(needle: impl Into<String>) -> Text {
    Text(needle.into())
}

impl Matcher for Text {
    fn evaluate(&self, screen: &Screen) -> Outcome {
        Outcome::new(
            screen.contains(&self.0),
            format!("screen to contain {:?}", self.0),
        )
    }
}

#[derive(Debug, Clone)]
pub struct Regexp {
    pattern: String,
    re: regex::Regex,
}

/// Matches when the screen text matches `pattern`.
///
/// The pattern is compiled once, here.
pub fn try_regexp(pattern: &str) -> Result<Regexp, regex::Error> {
    let re = regex::Regex::new(pattern)?;
    Ok(Regexp {
        pattern: pattern.to_string(),
        re,
    })
}

/// Like [`try_regexp`] but treats an invalid pattern as a bug in the test.
///
/// # Panics
///
/// Panics if `pattern` does not compile.
pub fn regexp(pattern: &str) -> Regexp {
    match try_regexp(pattern) {
        Ok(m) => m,
        Err(err) => panic!("crawler: regexp: invalid pattern {:?}: {}", pattern, err),
    }
}

impl Matcher for Regexp {
    fn evaluate(&self, screen: &Screen) -> Outcome {
        Outcome::new(
            self.re.is_match(screen.text()),
            format!("screen to match regexp {:?}", self.pattern),
        )
    }
}

#[derive(Debug, Clone)]
pub struct Line {
    row: usize,
    expected: String,
}

/// Matches when row `row` equals `expected` once trailing spaces are trimmed.
/// A missing row never matches.
pub fn line(row: usize, expected: impl Into<String>) -> Line {
    Line {
        row,
        expected: expected.into(),
    }
}

impl Matcher for Line {
    fn evaluate(&self, screen: &Screen) -> Outcome {
        let matched = screen
            .get_line(self.row)
            .is_some_and(|l| l.trim_end_matches(' ') == self.expected);
        Outcome::new(
            matched,
            format!("line {} to equal {:?}", self.row, self.expected),
        )
    }
}

#[derive(Debug, Clone)]
pub struct LineContains {
    row: usize,
    needle: String,
}

/// Matches when row `row` contains `needle`. A missing row never matches.
pub fn line_contains(row: usize, needle: impl Into<String>) -> LineContains {
    LineContains {
        row,
        needle: needle.into(),
    }
}

impl Matcher for LineContains {
    fn evaluate(&self, screen: &Screen) -> Outcome {
        let matched = screen
            .get_line(self.row)
            .is_some_and(|l| l.contains(&self.needle));
        Outcome::new(
            matched,
            format!("line {} to contain {:?}", self.row, self.needle),
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    row: u16,
    col: u16,
}

/// Matches when the cursor is known and sits at `(row, col)`, zero-indexed.
pub fn cursor(row: u16, col: u16) -> Cursor {
    Cursor { row, col }
}

impl Matcher for Cursor {
    fn evaluate(&self, screen: &Screen) -> Outcome {
        let desc = format!("cursor at row={}, col={}", self.row, self.col);
        match screen.cursor() {
            Some(pos) if pos.row == self.row && pos.col == self.col => Outcome::new(true, desc),
            Some(pos) => Outcome::new(false, format!("{} (actual: {})", desc, pos)),
            None => Outcome::new(false, format!("{} (actual: unavailable)", desc)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Empty;

/// Matches when the screen holds nothing but whitespace.
pub fn empty() -> Empty {
    Empty
}

impl Matcher for Empty {
    fn evaluate(&self, screen: &Screen) -> Outcome {
        Outcome::new(screen.text().trim().is_empty(), "screen to be empty")
    }
}

pub struct Not<M>(M);

/// Inverts `inner`.
pub fn not<M: Matcher>(inner: M) -> Not<M> {
    Not(inner)
}

impl<M: Matcher> Matcher for Not<M> {
    fn evaluate(&self, screen: &Screen) -> Outcome {
        let inner = self.0.evaluate(screen);
        Outcome::new(!inner.matched, format!("NOT({})", inner.description))
    }
}

pub struct All(Vec<Box<dyn Matcher>>);

/// Matches when every matcher matches, stopping at the first that does not.
///
/// The description lists each matcher evaluated, up to and including the
/// first failure. No matchers at all is vacuously true.
pub fn all(matchers: Vec<Box<dyn Matcher>>) -> All {
    All(matchers)
}

impl Matcher for All {
    fn evaluate(&self, screen: &Screen) -> Outcome {
        let mut descs = Vec::with_capacity(self.0.len());
        for m in &self.0 {
            let outcome = m.evaluate(screen);
            descs.push(outcome.description);
            if !outcome.matched {
                return Outcome::new(false, format!("all of: {}", descs.join(", ")));
            }
        }
        Outcome::new(true, format!("all of: {}", descs.join(", ")))
    }
}

pub struct Any(Vec<Box<dyn Matcher>>);

/// Matches when some matcher matches, stopping at the first that does.
///
/// The description lists each matcher evaluated, up to and including the
/// first match. No matchers at all is vacuously false.
pub fn any(matchers: Vec<Box<dyn Matcher>>) -> Any {
    Any(matchers)
}

impl Matcher for Any {
    fn evaluate(&self, screen: &Screen) -> Outcome {
        let mut descs = Vec::with_capacity(self.0.len());
        for m in &self.0 {
            let outcome = m.evaluate(screen);
            descs.push(outcome.description);
            if outcome.matched {
                return Outcome::new(true, format!("any of: {}", descs.join(", ")));
            }
        }
        Outcome::new(false, format!("any of: {}", descs.join(", ")))
    }
}

impl fmt::Debug for All {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("All").field(&self.0.len()).finish()
    }
}

impl fmt::Debug for Any {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Any").field(&self.0.len()).finish()
    }
}

/// Boxes each argument and builds an [`all`] matcher.
///
/// ```
/// use crawler_core::{all, text, not};
///
/// let _m = all![text("Saved"), not(text("Error"))];
/// ```
#[macro_export]
macro_rules! all {
    ($($m:expr),* $(,)?) => {
        $crate::matcher::all(vec![$($crate::Matcher::boxed($m)),*])
    };
}

/// Boxes each argument and builds an [`any`] matcher.
#[macro_export]
macro_rules! any {
    ($($m:expr),* $(,)?) => {
        $crate::matcher::any(vec![$($crate::Matcher::boxed($m)),*])
    };
}
