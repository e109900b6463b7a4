use std::cell::Cell;
use std::time::{Duration, Instant};

/// Time source for the panel. Everything that animates or polls works in
/// `Duration` since some start point, so tests can drive it by hand.
pub trait Clock {
    /// time since the clock started
    fn now(&self) -> Duration;

    /// block until `deadline` (or return at once if it has passed)
    fn sleep_until(&self, deadline: Duration);
}

/// wallclock, with accurate short sleeps courtesy of spin_sleep
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        SystemClock::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep_until(&self, deadline: Duration) {
        if let Some(wait) = deadline.checked_sub(self.now()) {
            spin_sleep::sleep(wait);
        }
    }
}

/// virtual time; only moves when told to, and "sleeping" jumps straight to
/// the deadline
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: Duration) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep_until(&self, deadline: Duration) {
        if deadline > self.now.get() {
            self.now.set(deadline);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let c = ManualClock::new();
        assert_eq!(c.now(), Duration::ZERO);
        c.advance(Duration::from_millis(30));
        c.advance(Duration::from_millis(20));
        assert_eq!(c.now(), Duration::from_millis(50));
    }

    #[test]
    fn test_manual_sleep_never_goes_back() {
        let c = ManualClock::new();
        c.set(Duration::from_millis(100));
        c.sleep_until(Duration::from_millis(40));
        assert_eq!(c.now(), Duration::from_millis(100));
        c.sleep_until(Duration::from_millis(150));
        assert_eq!(c.now(), Duration::from_millis(150));
    }

    #[test]
    fn test_system_clock_sleeps() {
        let c = SystemClock::new();
        let target = c.now() + Duration::from_millis(5);
        c.sleep_until(target);
        assert!(c.now() >= target);
        // a deadline in the past returns straight away
        c.sleep_until(Duration::ZERO);
    }
}
