//! Line-oriented fixture program driven by the integration tests.
//!
//! Prints `ready>` and answers one command per line:
//! `quit` exits 0, `fail` exits 1, `lines N` prints N numbered lines,
//! `size` reports the terminal size and anything else is echoed back.

use std::io::{self, BufRead, Write};
use std::process;

const PROMPT: &str = "ready>";

fn main() {
    let stdin = io::stdin();
    let mut out = io::stdout().lock();

    if prompt(&mut out).is_err() {
        process::exit(2);
    }

    for line in stdin.lock().lines() {
        let Ok(input) = line else {
            break;
        };
        let input = input.trim();

        let written = match input {
            "quit" => process::exit(0),
            "fail" => process::exit(1),
            "size" => match terminal_size() {
                Some((cols, rows)) => writeln!(out, "size: {}x{}", cols, rows),
                None => writeln!(out, "size: unknown"),
            },
            _ => match input.strip_prefix("lines ").map(str::trim) {
                Some(count) => print_lines(&mut out, count),
                None => writeln!(out, "echo: {}", input),
            },
        };

        if written.and_then(|_| prompt(&mut out)).is_err() {
            process::exit(2);
        }
    }
}

fn prompt(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", PROMPT)?;
    out.flush()
}

fn print_lines(out: &mut impl Write, count: &str) -> io::Result<()> {
    match count.parse::<usize>() {
        Ok(n) => (1..=n).try_for_each(|i| writeln!(out, "line {}", i)),
        Err(_) => writeln!(out, "echo: lines {}", count),
    }
}

#[cfg(unix)]
fn terminal_size() -> Option<(u16, u16)> {
    // SAFETY: TIOCGWINSZ only writes into the winsize we pass.
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };
    if rc != 0 || ws.ws_col == 0 {
        return None;
    }
    Some((ws.ws_col, ws.ws_row))
}

#[cfg(not(unix))]
fn terminal_size() -> Option<(u16, u16)> {
    None
}
