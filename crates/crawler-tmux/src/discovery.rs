//! Locating a usable tmux binary.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::TmuxError;
use crate::runner;

pub const MIN_TMUX_VERSION: &str = "3.0";

/// Environment variable consulted when no path is configured.
pub const TMUX_PATH_ENV: &str = "CRAWLER_TMUX";

/// A resolved tmux binary.
///
/// `explicit` records whether the caller named the binary (option or
/// environment) rather than it being found on `$PATH`. Problems with an
/// explicit binary are failures; problems with a discovered one mean the
/// environment cannot run the test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmuxBinary {
    pub path: PathBuf,
    pub explicit: bool,
}

/// Resolves tmux from, in order: `configured`, `$CRAWLER_TMUX`, `$PATH`.
pub fn resolve_tmux_path(configured: Option<&Path>) -> Result<TmuxBinary, TmuxError> {
    if let Some(path) = configured {
        return Ok(TmuxBinary {
            path: path.to_path_buf(),
            explicit: true,
        });
    }

    if let Some(path) = env::var_os(TMUX_PATH_ENV).filter(|v| !v.is_empty()) {
        return Ok(TmuxBinary {
            path: PathBuf::from(path),
            explicit: true,
        });
    }

    let path = which::which("tmux").map_err(|_| TmuxError::NotFound)?;
    debug!(path = %path.display(), "tmux found on PATH");
    Ok(TmuxBinary {
        path,
        explicit: false,
    })
}

/// Runs `tmux -V` and fails unless the version is at least
/// [`MIN_TMUX_VERSION`].
pub fn check_version(path: &Path) -> Result<String, TmuxError> {
    let version = runner::version(path)?;
    if !version_at_least(&version, MIN_TMUX_VERSION) {
        return Err(TmuxError::TooOld {
            version,
            minimum: MIN_TMUX_VERSION,
        });
    }
    Ok(version)
}

fn major_minor(version: &str) -> Option<(u32, u32)> {
    static VERSION_RE: OnceLock<Regex> = OnceLock::new();
    let re = VERSION_RE.get_or_init(|| {
        Regex::new(r"(\d+)\.(\d+)").unwrap_or_else(|e| panic!("version regex: {e}"))
    });
    let caps = re.captures(version)?;
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    Some((major, minor))
}

/// Compares the first `major.minor` found in each string.
///
/// Handles forms like `3.4`, `3.3a` and `next-3.5`. Unparsable input never
/// satisfies the minimum.
pub fn version_at_least(version: &str, minimum: &str) -> bool {
    match (major_minor(version), major_minor(minimum)) {
        (Some(v), Some(m)) => v >= m,
        _ => false,
    }
}
