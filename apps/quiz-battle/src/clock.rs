//! Time sources for driving battles.
//!
//! The engine never reads the clock itself; the host asks a [`TickDriver`] for
//! the time elapsed since its last call and passes that to the engine. Tests use
//! [`ManualClock`] to make every timer fire deterministically.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock {
    /// Time since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

/// Wall-clock time.
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
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Virtual clock advanced by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Jump to an absolute time. Moving backwards is ignored.
    pub fn set(&self, to: Duration) {
        if to > self.now.get() {
            self.now.set(to);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

/// Converts clock readings into elapsed-time deltas.
#[derive(Debug)]
pub struct TickDriver<C: Clock> {
    clock: C,
    last: Duration,
}

impl<C: Clock> TickDriver<C> {
    pub fn new(clock: C) -> Self {
        let last = clock.now();
        Self { clock, last }
    }

    /// Time since the previous call (or construction).
    pub fn elapsed(&mut self) -> Duration {
        let now = self.clock.now();
        let delta = now.saturating_sub(self.last);
        self.last = now;
        delta
    }

    /// Drop any time accumulated so far.
    pub fn reset(&mut self) {
        self.last = self.clock.now();
    }
}
