//! Elapsed-time collaborator.
//!
//! The engine only drives the start/stop/reset primitives; how the count is
//! displayed is up to the front end.

use std::time::{Duration, Instant};

pub trait Timer {
    /// Begins counting. Calling it while already running has no effect.
    fn start(&mut self);
    /// Freezes the count at its current value.
    fn stop(&mut self);
    /// Stops and zeroes the count.
    fn reset(&mut self);
    fn elapsed_secs(&self) -> u64;
}

/// Wall-clock stopwatch with one-second granularity.
#[derive(Clone, Debug, Default)]
pub struct Stopwatch {
    running_since: Option<Instant>,
    accumulated: Duration,
}

impl Stopwatch {
    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }
}

impl Timer for Stopwatch {
    fn start(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    fn stop(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
        }
    }

    fn reset(&mut self) {
        self.running_since = None;
        self.accumulated = Duration::ZERO;
    }

    fn elapsed_secs(&self) -> u64 {
        let live = self.running_since.map(|since| since.elapsed()).unwrap_or_default();
        (self.accumulated + live).as_secs()
    }
}

/// Timer that never counts, for headless use.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTimer;

impl Timer for NoTimer {
    fn start(&mut self) {}
    fn stop(&mut self) {}
    fn reset(&mut self) {}
    fn elapsed_secs(&self) -> u64 {
        0
    }
}
