//! Hardware configuration types
//!
//! Pin assignments and sampling setup for the grinder board.

/// Number of GPIO pins on the RP2040
pub const GPIO_COUNT: u8 = 30;

/// First ADC-capable GPIO (ADC0)
pub const FIRST_ADC_GPIO: u8 = 26;

/// Last ADC-capable GPIO (ADC3)
pub const LAST_ADC_GPIO: u8 = 29;

/// Number of DMA channels on the RP2040
pub const DMA_CHANNELS: u8 = 12;

/// Pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    /// GPIO pin number (0-29 for RP2040)
    pub pin: u8,
    /// Pin is active-low (inverted)
    pub inverted: bool,
    /// Enable internal pull-up
    pub pull_up: bool,
}

impl PinConfig {
    /// Active-high pin without pull
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
            pull_up: false,
        }
    }

    /// Active-low pin without pull
    pub const fn active_low(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
            pull_up: false,
        }
    }

    /// Active-low input with the internal pull-up enabled
    pub const fn pulled_up_active_low(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
            pull_up: true,
        }
    }
}

/// Pin assignments for the grinder board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinMap {
    /// Grind button input
    pub button: PinConfig,
    /// Motor FET driver
    pub motor: PinConfig,
    /// Charging-jack solenoid FET driver
    pub jack: PinConfig,
    /// Status LED used for the boot self-test
    pub status_led: PinConfig,
    /// Battery voltage sense input (must be ADC-capable)
    pub voltage_sense: u8,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            button: PinConfig::pulled_up_active_low(3),
            motor: PinConfig::active_low(5),
            jack: PinConfig::active_low(1),
            status_led: PinConfig::new(25),
            voltage_sense: 26,
        }
    }
}

impl PinMap {
    /// All GPIO numbers claimed by this map
    pub fn all(&self) -> [u8; 5] {
        [
            self.button.pin,
            self.motor.pin,
            self.jack.pin,
            self.status_led.pin,
            self.voltage_sense,
        ]
    }

    /// ADC multiplexer input for the voltage sense pin
    pub fn voltage_adc_input(&self) -> Option<u8> {
        adc_input_for_gpio(self.voltage_sense)
    }
}

/// Map an ADC-capable GPIO to its ADC multiplexer input (AINSEL)
pub fn adc_input_for_gpio(gpio: u8) -> Option<u8> {
    if (FIRST_ADC_GPIO..=LAST_ADC_GPIO).contains(&gpio) {
        Some(gpio - FIRST_ADC_GPIO)
    } else {
        None
    }
}

/// Voltage sampling configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SamplingConfig {
    /// DMA channel reserved for ADC captures
    pub dma_channel: u8,
    /// Stack a moving-average stage on top of the DMA averager
    pub smoothing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adc_input_mapping() {
        assert_eq!(adc_input_for_gpio(26), Some(0));
        assert_eq!(adc_input_for_gpio(29), Some(3));
        assert_eq!(adc_input_for_gpio(25), None);
        assert_eq!(adc_input_for_gpio(30), None);
    }

    #[test]
    fn test_default_pins_match_reference_board() {
        let pins = PinMap::default();
        assert_eq!(pins.button.pin, 3);
        assert!(pins.button.pull_up);
        assert!(pins.button.inverted);
        assert_eq!(pins.motor, PinConfig::active_low(5));
        assert_eq!(pins.jack, PinConfig::active_low(1));
        assert_eq!(pins.voltage_adc_input(), Some(0));
    }
}
