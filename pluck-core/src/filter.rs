//! Post-estimation filters: a sliding median over frequency estimates and a
//! snap-to-zero deadband on cents.

use std::collections::VecDeque;

use crate::error::{ConfigError, ConfigResult};

/// Sliding-window median over the last `size` estimates.
///
/// Octave jumps and noise spikes skew a mean but rarely land in the middle
/// of the sorted window.
#[derive(Debug, Clone)]
pub struct MedianFilter {
    size: usize,
    window: VecDeque<f32>,
    sorted: Vec<f32>,
}

impl MedianFilter {
    pub fn new(size: usize) -> ConfigResult<Self> {
        if size == 0 {
            return Err(ConfigError::EmptyMedianWindow);
        }
        Ok(Self {
            size,
            window: VecDeque::with_capacity(size),
            sorted: Vec::with_capacity(size),
        })
    }

    /// Adds `value` and returns the median of the current window.
    ///
    /// For an even number of values this is the upper of the two middle
    /// elements, `sorted[len / 2]`.
    pub fn push(&mut self, value: f32) -> f32 {
        if self.window.len() == self.size {
            self.window.pop_front();
        }
        self.window.push_back(value);

        self.sorted.clear();
        self.sorted.extend(self.window.iter().copied());
        self.sorted.sort_by(f32::total_cmp);
        self.sorted[self.sorted.len() / 2]
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}

/// Deadband that shows small deviations as exactly in tune.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CentsHysteresis {
    snap_to_zero_cents: i32,
}

impl CentsHysteresis {
    pub fn new(snap_to_zero_cents: i32) -> Self {
        Self { snap_to_zero_cents }
    }

    pub fn apply(&self, cents: i32) -> i32 {
        if cents.abs() <= self.snap_to_zero_cents { 0 } else { cents }
    }
}
