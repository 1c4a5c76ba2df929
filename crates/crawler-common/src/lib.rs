#![deny(clippy::all)]

mod names;
mod sync;

pub use names::MAX_SANITIZED_LEN;
pub use names::sanitize_name;
pub use sync::mutex_lock_or_recover;
