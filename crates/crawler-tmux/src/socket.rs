//! Per-session socket paths and server configuration files.

use std::fs;
use std::path::{Path, PathBuf};

use crawler_common::sanitize_name;

use crate::error::TmuxError;

pub const DEFAULT_HISTORY_LIMIT: u32 = 10_000;

const MAX_ATTEMPTS: usize = 10;

/// Returns an unused `crawler-<name>-<hex>.sock` path in the temp directory.
pub fn generate_socket_path(test_name: &str) -> Result<PathBuf, TmuxError> {
    generate_socket_path_in(&std::env::temp_dir(), test_name)
}

/// Like [`generate_socket_path`] but under `dir`. Regenerates the random
/// suffix on collision, giving up after a fixed number of attempts.
pub fn generate_socket_path_in(dir: &Path, test_name: &str) -> Result<PathBuf, TmuxError> {
    let sanitized = sanitize_name(test_name);
    for _ in 0..MAX_ATTEMPTS {
        let suffix: [u8; 4] = rand::random();
        let path = dir.join(format!("crawler-{}-{}.sock", sanitized, hex::encode(suffix)));
        if !path.exists() {
            return Ok(path);
        }
    }
    Err(TmuxError::SocketPath {
        attempts: MAX_ATTEMPTS,
    })
}

/// The server config file sitting next to a socket.
pub fn config_path_for(socket: &Path) -> PathBuf {
    let mut name = socket.as_os_str().to_owned();
    name.push(".conf");
    PathBuf::from(name)
}

/// Server options every crawler session needs. A zero history limit means
/// [`DEFAULT_HISTORY_LIMIT`].
pub fn config_contents(history_limit: u32) -> String {
    let limit = if history_limit == 0 {
        DEFAULT_HISTORY_LIMIT
    } else {
        history_limit
    };
    format!(
        "set-option -g history-limit {}\nset-option -g remain-on-exit on\nset-option -g status off\n",
        limit
    )
}

pub fn write_config(path: &Path, history_limit: u32) -> Result<(), TmuxError> {
    fs::write(path, config_contents(history_limit)).map_err(|source| TmuxError::Config {
        path: path.to_path_buf(),
        source,
    })
}
