use crate::screen::Screen;

/// Builds an 80x24 screen whose rows are `rows`, as capture-pane would print
/// them.
pub fn screen_of(rows: &[&str]) -> Screen {
    let mut raw = rows.join("\n");
    raw.push('\n');
    Screen::from_capture(&raw, 80, 24)
}
