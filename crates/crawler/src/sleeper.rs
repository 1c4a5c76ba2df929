//! Sleeper trait for deterministic timing in tests.
//!
//! The wait loop sleeps between polls through this trait so tests can swap in
//! a fake that advances virtual time instead of blocking the thread.

use std::thread;
use std::time::Duration;

pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Production sleeper that uses `thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealSleeper;

impl Sleeper for RealSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}
