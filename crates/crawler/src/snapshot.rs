//! Golden-file snapshots of screen content.
//!
//! Files live under `<root>/<test>-<hash>/<name>.txt`. Set `CRAWLER_UPDATE=1`
//! to write the current screen instead of comparing against it.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crawler_common::sanitize_name;
use crawler_core::Screen;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{CrawlerError, Result};

pub const UPDATE_ENV: &str = "CRAWLER_UPDATE";
pub const DEFAULT_ROOT: &str = "testdata";

const OP: &str = "snapshot";

/// Trims trailing spaces from every line, drops trailing blank lines and
/// ends the text with exactly one newline.
pub fn normalize_for_snapshot(raw: &str) -> String {
    let mut lines: Vec<&str> = raw.split('\n').map(|l| l.trim_end_matches(' ')).collect();
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn is_truthy(value: &str) -> bool {
    matches!(value, "1" | "true" | "yes")
}

/// Where golden files live and whether to overwrite them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStore {
    root: PathBuf,
    update: bool,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>, update: bool) -> Self {
        Self {
            root: root.into(),
            update,
        }
    }

    /// `testdata` under the current directory, updating when
    /// `CRAWLER_UPDATE` is `1`, `true` or `yes`.
    pub fn from_env() -> Self {
        let update = env::var(UPDATE_ENV).is_ok_and(|v| is_truthy(&v));
        Self::new(DEFAULT_ROOT, update)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn updating(&self) -> bool {
        self.update
    }

    /// Per-test directory. The hash keeps names that sanitize identically
    /// apart.
    pub fn dir_for(&self, test_name: &str) -> PathBuf {
        let digest = Sha256::digest(test_name.as_bytes());
        let short = hex::encode(&digest[..4]);
        self.root
            .join(format!("{}-{}", sanitize_name(test_name), short))
    }

    pub fn path_for(&self, test_name: &str, name: &str) -> PathBuf {
        self.dir_for(test_name)
            .join(format!("{}.txt", sanitize_name(name)))
    }

    /// Compares `screen` with its golden file, or writes it in update mode.
    pub fn assert_matches(&self, test_name: &str, name: &str, screen: &Screen) -> Result<()> {
        let content = normalize_for_snapshot(screen.text());
        let path = self.path_for(test_name, name);

        if self.update {
            return self.write(&path, &content);
        }

        let golden = match fs::read_to_string(&path) {
            Ok(golden) => golden,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(CrawlerError::SnapshotMissing {
                    path,
                    actual: content,
                });
            }
            Err(source) => {
                return Err(CrawlerError::Io {
                    op: OP,
                    action: "read",
                    path,
                    source,
                });
            }
        };

        if golden != content {
            return Err(CrawlerError::SnapshotMismatch {
                name: name.to_string(),
                path,
                golden,
                actual: content,
            });
        }
        Ok(())
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| CrawlerError::Io {
                op: OP,
                action: "create",
                path: dir.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| CrawlerError::Io {
            op: OP,
            action: "write",
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "golden file updated");
        Ok(())
    }
}

/// Checks `screen` against a golden file named after the current test.
pub fn assert_snapshot(screen: &Screen, name: &str) -> Result<()> {
    let test_name = crate::config::TerminalConfig::default().resolved_test_name();
    SnapshotStore::from_env().assert_matches(&test_name, name, screen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn screen(raw: &str) -> Screen {
        Screen::from_capture(raw, 20, 4)
    }

    #[test]
    fn test_normalize_trims_and_terminates() {
        assert_eq!(normalize_for_snapshot("a  \nb \n\n   \n"), "a\nb\n");
        assert_eq!(normalize_for_snapshot("x"), "x\n");
        assert_eq!(normalize_for_snapshot(""), "\n");
        assert_eq!(normalize_for_snapshot("\n\n"), "\n");
    }

    #[test]
    fn test_normalize_keeps_inner_blank_lines() {
        assert_eq!(normalize_for_snapshot("a\n\nb"), "a\n\nb\n");
    }

    #[test]
    fn test_truthy_values() {
        assert!(is_truthy("1"));
        assert!(is_truthy("true"));
        assert!(is_truthy("yes"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("TRUE"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn test_path_layout() {
        let store = SnapshotStore::new("testdata", false);
        let path = store.path_for("suite::case one", "main menu");
        let dir = path
            .parent()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        assert!(path.starts_with("testdata"));
        assert!(dir.starts_with("suite__case_one-"));
        assert_eq!(dir.len(), "suite__case_one-".len() + 8);
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("main_menu.txt"));
    }

    #[test]
    fn test_colliding_sanitized_names_get_distinct_dirs() {
        let store = SnapshotStore::new("testdata", false);
        assert_ne!(store.dir_for("a:b"), store.dir_for("a/b"));
    }

    #[test]
    fn test_missing_golden_fails_with_hint() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path(), false);

        let err = store
            .assert_matches("t", "home", &screen("hello"))
            .unwrap_err();

        assert!(matches!(err, CrawlerError::SnapshotMissing { .. }));
        let msg = err.to_string();
        assert!(msg.contains("CRAWLER_UPDATE=1"));
        assert!(msg.ends_with("Actual screen:\nhello\n"));
    }

    #[test]
    fn test_update_then_compare() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotStore::new(dir.path(), true);
        writer
            .assert_matches("t", "home", &screen("hello   \n\n"))
            .unwrap();

        let path = writer.path_for("t", "home");
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");

        let reader = SnapshotStore::new(dir.path(), false);
        reader.assert_matches("t", "home", &screen("hello")).unwrap();
    }

    #[test]
    fn test_mismatch_shows_both_versions() {
        let dir = tempfile::tempdir().unwrap();
        SnapshotStore::new(dir.path(), true)
            .assert_matches("t", "home", &screen("before"))
            .unwrap();

        let err = SnapshotStore::new(dir.path(), false)
            .assert_matches("t", "home", &screen("after"))
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("mismatch for \"home\""));
        assert!(msg.contains("--- golden ---\nbefore\n\n--- actual ---\nafter\n"));
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(raw in "[a-c \\n]{0,40}") {
            let once = normalize_for_snapshot(&raw);
            prop_assert_eq!(normalize_for_snapshot(&once), once);
        }

        #[test]
        fn prop_normalized_ends_with_single_newline(raw in "[a-c \\n]{0,40}") {
            let normalized = normalize_for_snapshot(&raw);
            prop_assert!(normalized.ends_with('\n'));
            prop_assert!(!normalized.ends_with("\n\n") || normalized == "\n");
        }
    }
}
