//! The tmux process host for crawler.
//!
//! Each [`TmuxRunner`] call maps to exactly one `tmux` invocation against a
//! private server socket, so a failure always points at a single command.
//! [`TmuxHost`] layers the pane-level operations of [`ProcessHost`] on top.

#![deny(clippy::all)]

pub mod discovery;
pub mod error;
mod host;
mod runner;
pub mod socket;

pub use discovery::MIN_TMUX_VERSION;
pub use discovery::TmuxBinary;
pub use discovery::check_version;
pub use discovery::resolve_tmux_path;
pub use discovery::version_at_least;
pub use error::TmuxError;
pub use host::PaneState;
pub use host::ProcessHost;
pub use host::SessionSpec;
pub use host::TmuxHost;
pub use host::resolve_pane;
pub use host::start_session;
pub use runner::TmuxRunner;
pub use runner::version;

pub type Result<T> = std::result::Result<T, TmuxError>;
