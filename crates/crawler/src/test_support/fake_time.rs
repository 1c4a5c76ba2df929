use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use crawler_common::mutex_lock_or_recover;

use crate::clock::Clock;
use crate::sleeper::Sleeper;

/// Virtual time: sleeping advances the clock instead of blocking.
#[derive(Debug, Clone)]
pub struct FakeTime {
    start: Instant,
    state: Arc<Mutex<TimeState>>,
}

#[derive(Debug, Default)]
struct TimeState {
    offset: Duration,
    tick: Duration,
    sleeps: Vec<Duration>,
}

impl FakeTime {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            state: Arc::new(Mutex::new(TimeState::default())),
        }
    }

    /// Every `now()` call also advances the clock by `tick`.
    pub fn with_tick(self, tick: Duration) -> Self {
        mutex_lock_or_recover(&self.state).tick = tick;
        self
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        mutex_lock_or_recover(&self.state).sleeps.clone()
    }

    pub fn elapsed(&self) -> Duration {
        mutex_lock_or_recover(&self.state).offset
    }
}

impl Default for FakeTime {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeTime {
    fn now(&self) -> Instant {
        let mut state = mutex_lock_or_recover(&self.state);
        let tick = state.tick;
        state.offset += tick;
        self.start + state.offset
    }
}

impl Sleeper for FakeTime {
    fn sleep(&self, duration: Duration) {
        let mut state = mutex_lock_or_recover(&self.state);
        state.offset += duration;
        state.sleeps.push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_advances_clock() {
        let time = FakeTime::new();
        let start = time.now();
        time.sleep(Duration::from_millis(50));
        time.sleep(Duration::from_millis(25));
        assert_eq!(time.now() - start, Duration::from_millis(75));
        assert_eq!(time.sleeps().len(), 2);
    }

    #[test]
    fn test_tick_advances_on_every_read() {
        let time = FakeTime::new().with_tick(Duration::from_millis(10));
        let first = time.now();
        let second = time.now();
        assert_eq!(second - first, Duration::from_millis(10));
        assert_eq!(time.elapsed(), Duration::from_millis(20));
    }
}
