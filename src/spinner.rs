//! Cooperative yielding for long-running whole-graph transformations
//!
//! The cycle cutter, the legacy tree converters and the subgraph builders
//! all walk every node of a graph that can hold hundreds of thousands of
//! entries. They are single-threaded by design, so a long walk would starve
//! whatever scheduler the embedding application runs on. Each of them
//! consults a [`TraversalSpinner`] per processed node and voluntarily yields
//! the thread once a time budget is exceeded.
//!
//! The path-to-root routines deliberately do not yield: they are expected to
//! finish quickly once memoized, and a suspension point in the hot loop
//! would defeat the cache.

use std::time::{Duration, Instant};

use crate::constants::spinner::DEFAULT_THRESHOLD;

/// Tracks elapsed busy time and yields the thread when it runs long.
///
/// Carries no atomicity or ordering guarantee: graphs are immutable and
/// there are no concurrent mutators by construction.
#[derive(Debug)]
pub struct TraversalSpinner {
    threshold: Duration,
    last_spin: Instant,
}

impl Default for TraversalSpinner {
    fn default() -> Self {
        Self::new()
    }
}

impl TraversalSpinner {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_THRESHOLD)
    }

    pub fn with_threshold(threshold: Duration) -> Self {
        Self {
            threshold,
            last_spin: Instant::now(),
        }
    }

    /// True once the traversal has run for longer than the threshold since
    /// the last yield.
    pub fn is_starving(&self) -> bool {
        self.last_spin.elapsed() > self.threshold
    }

    /// Hand control back to the scheduler and restart the clock.
    pub fn spin(&mut self) {
        std::thread::yield_now();
        self.reset();
    }

    pub fn reset(&mut self) {
        self.last_spin = Instant::now();
    }
}
