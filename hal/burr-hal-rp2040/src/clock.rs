//! Millisecond clock

use burr_core::{Tick, TimeSource};
use embassy_time::Instant;

/// [`TimeSource`] backed by the embassy time driver
///
/// The driver counts microseconds in 64 bits; ticks keep the low 32
/// bits of the millisecond count and wrap after ~49.7 days.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl TimeSource for EmbassyClock {
    fn now(&self) -> Tick {
        Tick::from_millis(Instant::now().as_millis() as u32)
    }
}
