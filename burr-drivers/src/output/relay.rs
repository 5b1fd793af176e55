//! FET/relay output
//!
//! Drives the motor and charging-jack switches. Either polarity is
//! supported; the board wiring decides which one a given output uses.

use core::convert::Infallible;

use burr_core::config::PinConfig;
use embedded_hal::digital::OutputPin;

/// Switched output with configurable polarity
///
/// Pins must be infallible: a switch command that could fail would
/// leave the controller unsure whether the motor is running.
pub struct Relay<P> {
    pin: P,
    /// If true, energized = pin LOW
    active_low: bool,
    /// Current logical state
    energized: bool,
}

impl<P: OutputPin<Error = Infallible>> Relay<P> {
    /// Create a relay output, driven to its inactive level
    pub fn new(pin: P, active_low: bool) -> Self {
        let mut relay = Self {
            pin,
            active_low,
            energized: false,
        };
        relay.set(false);
        relay
    }

    /// Create a relay whose polarity comes from a pin config
    pub fn from_config(pin: P, config: &PinConfig) -> Self {
        Self::new(pin, config.inverted)
    }

    /// Energize or release the output
    pub fn set(&mut self, energized: bool) {
        self.energized = energized;

        let result = if energized != self.active_low {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.unwrap_or_else(|e| match e {});
    }

    /// Current logical state
    pub fn is_energized(&self) -> bool {
        self.energized
    }

    /// Polarity of the output
    pub fn is_active_low(&self) -> bool {
        self.active_low
    }
}
