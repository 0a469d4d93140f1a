//! Time management utilities
//!
//! History queries that run past the newest recorded frame interpolate toward
//! the live pose using "now". The [`Clock`] trait supplies that value so the
//! host can plug in its own simulation clock and tests can pin it.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Source of the current simulation time in seconds
pub trait Clock {
    /// Current time in seconds on the same axis as recorded frame times
    fn now(&self) -> f64;
}

/// Wall clock measuring seconds since its creation
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    /// Create a clock whose time axis starts at zero now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Manually driven clock for deterministic simulations and tests
#[derive(Debug, Default)]
pub struct ManualClock {
    time: Cell<f64>,
}

impl ManualClock {
    /// Create a clock frozen at `time`
    pub fn new(time: f64) -> Self {
        Self {
            time: Cell::new(time),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, time: f64) {
        self.time.set(time);
    }

    /// Move the clock forward by `delta` seconds
    pub fn advance(&self, delta: f64) {
        self.time.set(self.time.get() + delta);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.time.get()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

/// Lap timer for repeated cast benchmarks
///
/// Each [`Stopwatch::lap`] closes the running interval and opens the next.
#[derive(Debug)]
pub struct Stopwatch {
    lap_start: Instant,
    laps: Vec<Duration>,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::start_new()
    }
}

impl Stopwatch {
    /// Start timing the first lap
    pub fn start_new() -> Self {
        Self {
            lap_start: Instant::now(),
            laps: Vec::new(),
        }
    }

    /// Close the current lap and return its duration
    pub fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let lap = now.duration_since(self.lap_start);
        self.laps.push(lap);
        self.lap_start = now;
        lap
    }

    /// Completed laps, oldest first
    pub fn laps(&self) -> &[Duration] {
        &self.laps
    }

    /// Sum of completed laps
    pub fn total(&self) -> Duration {
        self.laps.iter().sum()
    }

    /// Mean completed lap, zero before the first
    pub fn mean(&self) -> Duration {
        u32::try_from(self.laps.len())
            .ok()
            .filter(|&count| count > 0)
            .map_or(Duration::ZERO, |count| self.total() / count)
    }

    /// Time since the current lap started
    pub fn elapsed(&self) -> Duration {
        self.lap_start.elapsed()
    }
}
