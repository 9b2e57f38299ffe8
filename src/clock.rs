// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the time sources which can drive a [`CartesianDisplacement`](`crate::CartesianDisplacement`).
use std::cell::Cell;
use std::time::{Duration, Instant};

/// A time source. The returned time is relative to an arbitrary but fixed epoch.
pub trait Clock {
    /// current time since the epoch of the clock
    fn now(&self) -> Duration;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

/// Monotonic wall clock. Its epoch is the moment it was created.
#[derive(Debug, Copy, Clone)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        MonotonicClock::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Simulated clock which only moves when told to.
///
/// Lend it to a generator by reference to keep driving it:
/// ```
/// use displacement::{CartesianDisplacement, ManualClock};
/// let clock = ManualClock::new();
/// let generator = CartesianDisplacement::with_clock(None, &clock);
/// clock.advance_secs(0.5);
/// # assert!(!generator.is_active());
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    /// creates a clock at time zero
    pub fn new() -> Self {
        ManualClock {
            now: Cell::new(Duration::from_secs(0)),
        }
    }
    /// sets the current time
    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
    /// sets the current time in \[s\]
    pub fn set_secs(&self, secs: f64) {
        self.set(Duration::from_secs_f64(secs));
    }
    /// moves the clock forward
    pub fn advance(&self, step: Duration) {
        self.now.set(self.now.get() + step);
    }
    /// moves the clock forward by `secs` \[s\]
    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use crate::clock::{Clock, ManualClock, MonotonicClock};
    use std::time::Duration;

    #[test]
    fn manual_clock_moves_on_demand() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::from_secs(0));
        clock.advance(Duration::from_millis(10));
        clock.advance_secs(0.5);
        assert_eq!(clock.now(), Duration::from_millis(510));
        clock.set_secs(2.0);
        let borrowed = &clock;
        assert_eq!(borrowed.now(), Duration::from_secs(2));
    }

    #[test]
    fn monotonic_clock_does_not_go_back() {
        let clock = MonotonicClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
