//! Monotonic millisecond ticks
//!
//! The hardware counter is 32 bits wide and wraps after ~49.7 days.
//! All durations are computed with wrapping subtraction so a single
//! wraparound between two readings is harmless.

/// Opaque monotonic millisecond count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tick(u32);

impl Tick {
    /// Create a tick from a raw millisecond counter value
    pub const fn from_millis(ms: u32) -> Self {
        Self(ms)
    }

    /// Raw counter value
    pub const fn as_millis(self) -> u32 {
        self.0
    }

    /// Signed difference `self - earlier`, modulo 2^32
    ///
    /// Negative when `earlier` is actually later than `self`.
    pub const fn diff(self, earlier: Tick) -> i32 {
        self.0.wrapping_sub(earlier.0) as i32
    }

    /// Milliseconds elapsed from `earlier` to `self`, clamped at zero
    pub const fn millis_since(self, earlier: Tick) -> u32 {
        let d = self.diff(earlier);
        if d < 0 {
            0
        } else {
            d as u32
        }
    }

    /// Tick `ms` milliseconds after this one
    pub const fn wrapping_add(self, ms: u32) -> Self {
        Self(self.0.wrapping_add(ms))
    }
}

/// Source of monotonic time
pub trait TimeSource {
    /// Current tick
    fn now(&self) -> Tick;

    /// Milliseconds elapsed since `since`, which must come from a prior `now()`
    fn elapsed(&self, since: Tick) -> u32 {
        self.now().millis_since(since)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> Tick {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use proptest::prelude::*;

    struct FakeClock(Cell<u32>);

    impl TimeSource for FakeClock {
        fn now(&self) -> Tick {
            Tick::from_millis(self.0.get())
        }
    }

    #[test]
    fn test_elapsed_simple() {
        let clock = FakeClock(Cell::new(1_000));
        let start = clock.now();
        clock.0.set(1_250);
        assert_eq!(clock.elapsed(start), 250);
    }

    #[test]
    fn test_wraparound() {
        let start = Tick::from_millis(u32::MAX - 5);
        let later = Tick::from_millis(10);
        assert_eq!(later.diff(start), 16);
        assert_eq!(later.millis_since(start), 16);
    }

    #[test]
    fn test_wrapping_add_crosses_max() {
        let start = Tick::from_millis(u32::MAX - 1);
        let later = start.wrapping_add(3);
        assert_eq!(later.as_millis(), 1);
        assert_eq!(later.millis_since(start), 3);
    }

    #[test]
    fn test_reversed_order_is_clamped() {
        let a = Tick::from_millis(500);
        let b = Tick::from_millis(400);
        assert_eq!(b.diff(a), -100);
        assert_eq!(b.millis_since(a), 0);
    }

    proptest! {
        /// Any forward gap under 2^31 ms survives the wrap unchanged
        #[test]
        fn prop_elapsed_across_wrap(start in any::<u32>(), gap in 0u32..=(i32::MAX as u32)) {
            let a = Tick::from_millis(start);
            let b = a.wrapping_add(gap);
            prop_assert_eq!(b.millis_since(a), gap);
            // Reversed order never reports a huge positive gap
            prop_assert_eq!(a.millis_since(b), 0);
        }
    }
}
