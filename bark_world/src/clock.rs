//! World clock - the monotonic time source used for deferred bark commands.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic time source, in seconds.
pub trait Clock {
    fn now(&self) -> f64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

/// A clock advanced explicitly by the game loop (or by tests).
#[derive(Debug, Default)]
pub struct ManualClock {
    seconds: Cell<f64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at a given time.
    pub fn starting_at(seconds: f64) -> Self {
        Self {
            seconds: Cell::new(seconds),
        }
    }

    /// Advance time by `seconds`. Negative steps are ignored to keep the clock monotonic.
    pub fn advance(&self, seconds: f64) {
        if seconds > 0.0 {
            self.seconds.set(self.seconds.get() + seconds);
        }
    }

    /// Jump to an absolute time, never moving backwards.
    pub fn set(&self, seconds: f64) {
        if seconds > self.seconds.get() {
            self.seconds.set(seconds);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.seconds.get()
    }
}

/// Wall-clock backed time, measured from when the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), 0.0);

        clock.advance(2.5);
        clock.advance(-10.0);
        assert_eq!(clock.now(), 2.5);

        clock.set(1.0);
        assert_eq!(clock.now(), 2.5);
        clock.set(7.0);
        assert_eq!(clock.now(), 7.0);
    }

    #[test]
    fn test_shared_clock() {
        let clock = Rc::new(ManualClock::starting_at(3.0));
        let handle = Rc::clone(&clock);
        clock.advance(1.0);
        assert_eq!(handle.now(), 4.0);
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
