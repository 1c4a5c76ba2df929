use std::fmt;

/// Zero-indexed cursor location reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursorPosition {
    pub row: u16,
    pub col: u16,
}

impl CursorPosition {
    pub fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CursorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row={}, col={}", self.row, self.col)
    }
}

/// An immutable capture of terminal content.
///
/// `width` and `height` are the dimensions declared for the pane at capture
/// time. They need not equal the number of lines: scrollback captures carry
/// more rows than the visible height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    lines: Vec<String>,
    raw: String,
    width: usize,
    height: usize,
    cursor: Option<CursorPosition>,
}

impl Screen {
    /// Builds a screen from raw `capture-pane` output.
    ///
    /// Line endings are normalized to `\n` and exactly one trailing newline is
    /// removed. The cursor starts out unknown.
    #[doc(hidden)]
    pub fn from_capture(raw: &str, width: usize, height: usize) -> Self {
        let mut raw = raw.replace("\r\n", "\n");
        if raw.ends_with('\n') {
            raw.pop();
        }
        let lines = raw.split('\n').map(str::to_string).collect();

        Self {
            lines,
            raw,
            width,
            height,
            cursor: None,
        }
    }

    /// Returns the same capture with a known cursor position.
    #[doc(hidden)]
    pub fn with_cursor(mut self, cursor: CursorPosition) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Full screen content, rows joined by `\n`.
    pub fn text(&self) -> &str {
        &self.raw
    }

    /// A copy of the rows; callers may modify it freely.
    pub fn lines(&self) -> Vec<String> {
        self.lines.clone()
    }

    /// Number of captured rows.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Row `n`, zero-indexed, when it exists.
    pub fn get_line(&self, n: usize) -> Option<&str> {
        self.lines.get(n).map(String::as_str)
    }

    /// Row `n`, zero-indexed.
    ///
    /// # Panics
    ///
    /// Panics if `n` is not below [`Screen::line_count`]. Use
    /// [`Screen::get_line`] when the row may be missing.
    pub fn line(&self, n: usize) -> &str {
        match self.lines.get(n) {
            Some(line) => line,
            None => panic!(
                "crawler: screen line {} out of range (screen has {} lines)",
                n,
                self.lines.len()
            ),
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.raw.contains(needle)
    }

    /// Declared `(width, height)`.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Cursor position, or `None` when the host could not report one.
    pub fn cursor(&self) -> Option<CursorPosition> {
        self.cursor
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
