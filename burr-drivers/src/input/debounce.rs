//! Time-hysteresis debouncer
//!
//! The debounced output follows the raw input only after the raw input
//! has stayed unchanged for longer than the hysteresis. Every raw
//! transition restarts the timer, so a bounce that flips back before
//! the hysteresis elapses never reaches the output.

use burr_core::Tick;

/// Debouncer for any small copyable input value
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    /// Raw value seen on the previous call
    previous: T,
    /// When the raw value last changed
    changed_at: Tick,
    /// Current debounced value
    output: T,
    hysteresis_ms: u32,
}

impl<T: Copy + PartialEq> Debouncer<T> {
    /// Create a debouncer whose output starts at `initial`
    pub fn new(initial: T, now: Tick, hysteresis_ms: u32) -> Self {
        Self {
            previous: initial,
            changed_at: now,
            output: initial,
            hysteresis_ms,
        }
    }

    /// Feed one raw sample taken at `now`; returns the debounced value
    pub fn observe(&mut self, raw: T, now: Tick) -> T {
        if raw != self.previous {
            self.previous = raw;
            self.changed_at = now;
        } else if raw != self.output && now.millis_since(self.changed_at) > self.hysteresis_ms {
            self.output = raw;
        }

        self.output
    }

    /// Current debounced value
    pub fn output(&self) -> T {
        self.output
    }

    /// Configured hysteresis
    pub fn hysteresis_ms(&self) -> u32 {
        self.hysteresis_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HYSTERESIS_MS: u32 = 20;

    fn t(ms: u32) -> Tick {
        Tick::from_millis(ms)
    }

    #[test]
    fn test_commit_after_hysteresis() {
        let mut d = Debouncer::new(false, t(0), HYSTERESIS_MS);

        assert!(!d.observe(true, t(100)));
        assert!(!d.observe(true, t(110)));
        // Exactly at the hysteresis: not yet
        assert!(!d.observe(true, t(120)));
        assert!(d.observe(true, t(121)));
        assert!(d.output());
    }

    #[test]
    fn test_bounce_restarts_timer() {
        let mut d = Debouncer::new(false, t(0), HYSTERESIS_MS);

        d.observe(true, t(100));
        d.observe(false, t(115));
        d.observe(true, t(118));
        // 24ms after the first edge but only 6ms after the last one
        assert!(!d.observe(true, t(124)));
        assert!(!d.observe(true, t(138)));
        assert!(d.observe(true, t(139)));
    }

    #[test]
    fn test_change_sample_never_commits() {
        let mut d = Debouncer::new(false, t(0), HYSTERESIS_MS);
        // First sample of a new level is only recorded, even after a long gap
        assert!(!d.observe(true, t(1_000)));
        assert!(d.observe(true, t(1_021)));
    }

    #[test]
    fn test_release_is_debounced_too() {
        let mut d = Debouncer::new(true, t(0), HYSTERESIS_MS);
        assert!(d.observe(false, t(10)));
        assert!(d.observe(false, t(30)));
        assert!(!d.observe(false, t(31)));
    }

    #[test]
    fn test_across_tick_wrap() {
        let start = u32::MAX - 10;
        let mut d = Debouncer::new(0u8, t(start), HYSTERESIS_MS);
        d.observe(1, t(start));
        assert_eq!(d.observe(1, t(start.wrapping_add(15))), 0);
        assert_eq!(d.observe(1, t(start.wrapping_add(21))), 1);
    }

    proptest! {
        /// Pulses shorter than the hysteresis never reach the output
        #[test]
        fn prop_short_pulses_rejected(
            pulses in prop::collection::vec((1usize..5, 0u32..5, 1u32..200), 1..40)
        ) {
            let mut now = 0u32;
            let mut d = Debouncer::new(false, t(now), HYSTERESIS_MS);

            for (samples, step_ms, gap_ms) in pulses {
                // At most 3 steps of under 5ms: the pulse spans < 20ms
                for i in 0..samples {
                    if i > 0 {
                        now += step_ms;
                    }
                    prop_assert!(!d.observe(true, t(now)));
                }
                now += gap_ms;
                prop_assert!(!d.observe(false, t(now)));
                now += gap_ms;
                prop_assert!(!d.observe(false, t(now)));
            }
        }

        /// A level held past the hysteresis is committed, never before
        #[test]
        fn prop_held_level_committed(start in any::<u32>(), step_ms in 1u32..8) {
            let mut d = Debouncer::new(false, t(start), HYSTERESIS_MS);
            let edge = start.wrapping_add(50);
            d.observe(true, t(edge));

            let mut elapsed = 0u32;
            loop {
                elapsed += step_ms;
                let out = d.observe(true, t(edge.wrapping_add(elapsed)));
                if elapsed > HYSTERESIS_MS {
                    prop_assert!(out);
                    break;
                }
                prop_assert!(!out);
            }
        }
    }
}
