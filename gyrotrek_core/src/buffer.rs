//! Fixed-capacity ordered store for one recording window.

use crate::sample::{AngularSample, LinearSample};

/// Holds the `(angular, linear)` pair for each completed interval, in
/// temporal order. Slots are written once, in sequence; writes at or
/// beyond capacity are silently ignored so the window simply stops
/// accumulating once full.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    slots: Vec<(AngularSample, LinearSample)>,
    capacity: usize,
}

impl SampleBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Store the pair for interval `index`. A no-op when `index` is at or
    /// beyond capacity. Slots must be filled in order; a gap would mean
    /// the control loop skipped an interval.
    pub fn write(&mut self, index: usize, angular: AngularSample, linear: LinearSample) {
        if index >= self.capacity {
            return;
        }
        debug_assert_eq!(index, self.slots.len(), "buffer writes must be sequential");
        if index == self.slots.len() {
            self.slots.push((angular, linear));
        }
    }

    pub fn get(&self, index: usize) -> Option<(&AngularSample, &LinearSample)> {
        self.slots.get(index).map(|(a, l)| (a, l))
    }

    /// The most recently stored angular sample, used as the predecessor
    /// for differencing. None at the start of a session.
    pub fn last_angular(&self) -> Option<&AngularSample> {
        self.slots.last().map(|(a, _)| a)
    }

    pub fn linear_samples(&self) -> impl Iterator<Item = &LinearSample> {
        self.slots.iter().map(|(_, l)| l)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
