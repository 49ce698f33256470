use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// A monotonic time source reporting milliseconds since an arbitrary epoch.
///
/// Two reads separated by real time `Δ` must differ by `>= 0` and approximate `Δ`. Reading the
/// clock has no side effects on the system under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;

    /// Block until `duration` has passed on this clock.
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Wall clock backed by [Instant]. The epoch is the moment the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        Instant::now()
            .saturating_duration_since(self.epoch)
            .as_secs_f64()
            * 1000.0
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a fake render target can hold a clone and advance it to
/// simulate the cost of a frame. A stepping clock additionally advances by a fixed amount after
/// every read, which keeps time moving in loops that never advance it explicitly.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<Mutex<f64>>,
    step_ms: f64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock that advances by `step_ms` each time it is read.
    pub fn stepping(step_ms: f64) -> Self {
        Self {
            now_ms: Arc::new(Mutex::new(0.0)),
            step_ms: step_ms.max(0.0),
        }
    }

    /// Move the clock forward. Negative amounts are ignored so that time never goes backwards.
    pub fn advance(&self, ms: f64) {
        if ms > 0.0 {
            *self.now_ms.lock() += ms;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        let mut now_ms = self.now_ms.lock();
        let current = *now_ms;
        *now_ms += self.step_ms;
        current
    }

    /// Jumps forward instead of blocking.
    fn sleep(&self, duration: Duration) {
        self.advance(duration.as_secs_f64() * 1000.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let first = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = clock.now();

        assert!(first >= 0.0);
        assert!(second - first >= 1.0);
    }

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new();
        let other = clock.clone();

        other.advance(16.5);
        assert_eq!(16.5, clock.now());

        clock.advance(-5.0);
        assert_eq!(16.5, other.now());
    }

    #[test]
    fn stepping_clock_advances_per_read() {
        let clock = ManualClock::stepping(2.0);

        assert_eq!(0.0, clock.now());
        assert_eq!(2.0, clock.now());
        clock.advance(10.0);
        assert_eq!(14.0, clock.now());
    }

    #[test]
    fn manual_clock_sleep_jumps_forward() {
        let clock = ManualClock::new();
        let started = Instant::now();

        clock.sleep(Duration::from_secs(60));

        assert_eq!(60_000.0, clock.now());
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
