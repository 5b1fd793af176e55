//! Moving-average wrapper for any voltage source

use burr_core::traits::{VoltageSample, VoltageSource};

use super::MovingAverage;

/// Voltage source whose readings pass through a `K`-sample moving average
///
/// The window is seeded from the inner source's first reading so the
/// output starts at the real battery level instead of ramping up from 0.
pub struct Smoothed<S, const K: usize> {
    source: S,
    filter: MovingAverage<K>,
}

impl<S: VoltageSource, const K: usize> Smoothed<S, K> {
    /// Wrap `source`, taking one reading to seed the window
    pub fn new(mut source: S) -> Self {
        let first = source.read_voltage();
        Self {
            source,
            filter: MovingAverage::new(first),
        }
    }

    /// The wrapped source
    pub fn inner(&self) -> &S {
        &self.source
    }

    /// The wrapped source, mutably
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: VoltageSource, const K: usize> VoltageSource for Smoothed<S, K> {
    fn read_voltage(&mut self) -> VoltageSample {
        let raw = self.source.read_voltage();
        self.filter.update(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Script {
        values: [u16; 6],
        idx: usize,
    }

    impl VoltageSource for Script {
        fn read_voltage(&mut self) -> VoltageSample {
            let v = self.values[self.idx.min(self.values.len() - 1)];
            self.idx += 1;
            v
        }
    }

    #[test]
    fn test_seeded_from_first_reading() {
        let mut s = Smoothed::<_, 2>::new(Script {
            values: [2000, 2000, 3000, 3000, 3000, 3000],
            idx: 0,
        });
        assert_eq!(s.inner().idx, 1);

        assert_eq!(s.read_voltage(), 2000);
        assert_eq!(s.read_voltage(), 2500);
        assert_eq!(s.read_voltage(), 3000);
    }
}
