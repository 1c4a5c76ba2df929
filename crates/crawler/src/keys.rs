//! Named keys and their tmux spellings.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Escape,
    Tab,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Space,
    Delete,
    /// Function key, `F(1)` through `F(12)`.
    F(u8),
    Ctrl(char),
    Alt(char),
}

impl Key {
    /// The name `tmux send-keys` understands.
    pub fn tmux_name(&self) -> String {
        match self {
            Key::Enter => "Enter".to_string(),
            Key::Escape => "Escape".to_string(),
            Key::Tab => "Tab".to_string(),
            Key::Backspace => "BSpace".to_string(),
            Key::Up => "Up".to_string(),
            Key::Down => "Down".to_string(),
            Key::Left => "Left".to_string(),
            Key::Right => "Right".to_string(),
            Key::Home => "Home".to_string(),
            Key::End => "End".to_string(),
            Key::PageUp => "PageUp".to_string(),
            Key::PageDown => "PageDown".to_string(),
            Key::Space => "Space".to_string(),
            Key::Delete => "DC".to_string(),
            Key::F(n) => format!("F{}", n),
            Key::Ctrl(c) => format!("C-{}", c),
            Key::Alt(c) => format!("M-{}", c),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tmux_name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown key: {0:?}")]
pub struct ParseKeyError(String);

impl FromStr for Key {
    type Err = ParseKeyError;

    /// Key names and modifier prefixes are case-insensitive. The character
    /// after `Ctrl+` or `Alt+` keeps its case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ParseKeyError(s.to_string());
        let lower = s.trim().to_ascii_lowercase();

        if let Some(rest) = strip_modifier(s.trim(), &["ctrl+", "control+", "c-"]) {
            return single_char(rest).map(Key::Ctrl).ok_or_else(unknown);
        }
        if let Some(rest) = strip_modifier(s.trim(), &["alt+", "meta+", "m-"]) {
            return single_char(rest).map(Key::Alt).ok_or_else(unknown);
        }

        let key = match lower.as_str() {
            "enter" | "return" => Key::Enter,
            "escape" | "esc" => Key::Escape,
            "tab" => Key::Tab,
            "backspace" | "bspace" => Key::Backspace,
            "up" | "arrowup" => Key::Up,
            "down" | "arrowdown" => Key::Down,
            "left" | "arrowleft" => Key::Left,
            "right" | "arrowright" => Key::Right,
            "home" => Key::Home,
            "end" => Key::End,
            "pageup" | "pgup" => Key::PageUp,
            "pagedown" | "pgdn" => Key::PageDown,
            "space" => Key::Space,
            "delete" | "del" | "dc" => Key::Delete,
            other => match other.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                Some(n @ 1..=12) => Key::F(n),
                _ => return Err(unknown()),
            },
        };
        Ok(key)
    }
}

/// Strips the first matching modifier prefix, ignoring ASCII case.
fn strip_modifier<'a>(s: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|prefix| {
        let head = s.get(..prefix.len())?;
        if head.eq_ignore_ascii_case(prefix) {
            s.get(prefix.len()..)
        } else {
            None
        }
    })
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
