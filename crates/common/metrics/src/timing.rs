//! Timing utilities for histogram metrics.

use std::time::Instant;

use crate::Histogram;

/// A guard that records elapsed time to a histogram when dropped.
///
/// Takes the histogram by value so that a labelled child of a
/// `HistogramVec` can be timed as easily as a plain histogram.
pub struct TimingGuard {
    histogram: Histogram,
    start: Instant,
}

impl TimingGuard {
    pub fn new(histogram: Histogram) -> Self {
        Self {
            histogram,
            start: Instant::now(),
        }
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
