//! Deterministic stand-ins for tmux and the wall clock.

mod fake_time;
mod mock_host;

pub use fake_time::FakeTime;
pub use mock_host::MockHost;
pub use mock_host::Sent;
