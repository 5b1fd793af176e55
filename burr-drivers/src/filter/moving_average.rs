//! Fixed-point moving average
//!
//! Keeps the last `K` samples and a running accumulator scaled by 2^16.
//! Each update adds `(new - evicted) * 2^16 / K` to the accumulator, so
//! the cost per sample is constant regardless of window size. `K` must
//! be a power of two, which makes the per-sample increment exact and
//! guarantees the output converges to a constant input with no residue.

use heapless::Deque;

const FRACTION_BITS: u32 = 16;

/// Moving average over the last `K` samples
///
/// `K` must be a power of two; any other window length is rejected at
/// compile time so the per-sample increment stays exact.
#[derive(Debug, Clone)]
pub struct MovingAverage<const K: usize> {
    window: Deque<u16, K>,
    /// Window mean scaled by 2^16
    accumulator: i64,
}

impl<const K: usize> MovingAverage<K> {
    /// Accumulator weight of a single sample
    const STEP: i64 = {
        assert!(K.is_power_of_two(), "moving average window must be a power of two");
        (1i64 << FRACTION_BITS) / K as i64
    };

    /// Create a filter whose window is pre-filled with `initial`
    pub fn new(initial: u16) -> Self {
        let mut window = Deque::new();
        for _ in 0..K {
            let _ = window.push_back(initial);
        }

        Self {
            window,
            accumulator: i64::from(initial) * Self::STEP * K as i64,
        }
    }

    /// Push a sample, evicting the oldest; returns the new average
    pub fn update(&mut self, sample: u16) -> u16 {
        // The window is always full, so the pop always yields a value
        let evicted = self.window.pop_front().unwrap_or(sample);
        let _ = self.window.push_back(sample);

        self.accumulator += (i64::from(sample) - i64::from(evicted)) * Self::STEP;
        self.value()
    }

    /// Current average, truncated
    pub fn value(&self) -> u16 {
        (self.accumulator >> FRACTION_BITS) as u16
    }

    /// Window length
    pub const fn window_len(&self) -> usize {
        K
    }
}
