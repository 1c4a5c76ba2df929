//! Tracing for test binaries that drive crawler.
//!
//! By default events go through libtest's captured output, so the tmux
//! traces of a test are only printed when that test fails. Set `CRAWLER_LOG`
//! to a path to collect every test's events in one file instead.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;

use tracing::{Subscriber, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::TestWriter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub const LOG_FILE_ENV: &str = "CRAWLER_LOG";

/// Filter used when `RUST_LOG` is unset: warnings from crawler's own crates.
pub const DEFAULT_DIRECTIVES: &str = "crawler=warn,crawler_tmux=warn";

/// Keeps the background file writer alive. Drop it last.
#[derive(Debug)]
pub struct TelemetryGuard {
    _guard: Option<WorkerGuard>,
}

impl TelemetryGuard {
    fn disabled() -> Self {
        Self { _guard: None }
    }
}

/// Where log events are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    /// libtest's per-test captured output.
    TestOutput,
    File(PathBuf),
}

impl LogSink {
    /// `File` when `CRAWLER_LOG` names a path, `TestOutput` otherwise.
    pub fn from_env() -> Self {
        match std::env::var_os(LOG_FILE_ENV).filter(|v| !v.is_empty()) {
            Some(path) => LogSink::File(PathBuf::from(path)),
            None => LogSink::TestOutput,
        }
    }

    fn make_writer(&self) -> io::Result<(BoxMakeWriter, Option<WorkerGuard>)> {
        match self {
            LogSink::TestOutput => Ok((BoxMakeWriter::new(TestWriter::new()), None)),
            LogSink::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                Ok((BoxMakeWriter::new(non_blocking), Some(guard)))
            }
        }
    }
}

fn build_subscriber(
    filter: EnvFilter,
    writer: BoxMakeWriter,
) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_ansi(false)
        .with_writer(writer)
        .finish()
}

/// Installs the global subscriber for this test binary. `RUST_LOG` overrides
/// [`DEFAULT_DIRECTIVES`].
///
/// Only the first call installs anything; later calls return a disabled guard.
pub fn init_tracing() -> TelemetryGuard {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let sink = LogSink::from_env();

    let (writer, guard, open_error) = match sink.make_writer() {
        Ok((writer, guard)) => (writer, guard, None),
        Err(err) => (BoxMakeWriter::new(TestWriter::new()), None, Some(err)),
    };

    if tracing::subscriber::set_global_default(build_subscriber(filter, writer)).is_err() {
        return TelemetryGuard::disabled();
    }

    if let (Some(err), LogSink::File(path)) = (open_error, &sink) {
        warn!(path = %path.display(), error = %err, "cannot open log file, using test output");
    }

    TelemetryGuard { _guard: guard }
}
