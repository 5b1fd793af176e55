//! Grinder behaviour configuration
//!
//! Voltage thresholds, grind timing and the top-level [`GrinderConfig`].

use super::hardware::{PinMap, SamplingConfig, DMA_CHANNELS, GPIO_COUNT};
use crate::traits::VoltageSample;

/// Default debounce hysteresis for the grind button
pub const DEFAULT_DEBOUNCE_MS: u32 = 20;

/// Battery voltage thresholds, in raw 12-bit ADC units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VoltageThresholds {
    /// At or below this reading, idle switches to charging
    pub charge_start: VoltageSample,
    /// At or above this reading, charging returns to idle
    pub charge_stop: VoltageSample,
    /// Auto-grind stops once the voltage recovers to this percentage
    /// of the voltage seen when auto-grind started (110 = ×1.1)
    pub autogrind_stop_percent: u16,
}

impl Default for VoltageThresholds {
    fn default() -> Self {
        Self {
            charge_start: 1000,
            charge_stop: 3000,
            autogrind_stop_percent: 110,
        }
    }
}

impl VoltageThresholds {
    /// Battery is low enough that charging should begin
    pub fn should_start_charging(&self, voltage: VoltageSample) -> bool {
        voltage <= self.charge_start
    }

    /// Battery is full enough that charging should end
    pub fn should_stop_charging(&self, voltage: VoltageSample) -> bool {
        voltage >= self.charge_stop
    }

    /// Voltage has recovered far enough above `start_voltage` that the
    /// beans are gone and the motor is running unloaded
    pub fn should_stop_grinding(
        &self,
        voltage: VoltageSample,
        start_voltage: VoltageSample,
    ) -> bool {
        u32::from(voltage) * 100 >= u32::from(start_voltage) * u32::from(self.autogrind_stop_percent)
    }
}

/// What a button press does while auto-grinding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AutoGrindStopPolicy {
    /// Keep the motor running and continue as a manual grind
    #[default]
    ManualGrind,
    /// Stop the motor first, return to idle once the button is released
    StopFirst,
}

/// Grind timing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlConfig {
    /// A press released before this is a tap (auto-grind); held longer is manual
    pub tap_timeout_ms: u32,
    /// Auto-grind is forced off after this long
    pub safety_stop_ms: u32,
    /// Button press handling during auto-grind
    pub stop_policy: AutoGrindStopPolicy,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tap_timeout_ms: 1000,
            safety_stop_ms: 60 * 1000,
            stop_policy: AutoGrindStopPolicy::ManualGrind,
        }
    }
}

/// Complete grinder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GrinderConfig {
    /// Pin assignments
    pub pins: PinMap,
    /// Battery thresholds
    pub thresholds: VoltageThresholds,
    /// Grind timing
    pub control: ControlConfig,
    /// Button debounce hysteresis
    pub debounce_ms: u32,
    /// Voltage sampling
    pub sampling: SamplingConfig,
}

impl Default for GrinderConfig {
    fn default() -> Self {
        Self {
            pins: PinMap::default(),
            thresholds: VoltageThresholds::default(),
            control: ControlConfig::default(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            sampling: SamplingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `charge_start` must be below `charge_stop`
    ThresholdOrder,
    /// Auto-grind stop percentage must exceed 100
    StopFactorTooLow,
    /// A timeout is zero
    ZeroTimeout,
    /// Tap timeout must be shorter than the safety stop
    TapTimeoutTooLong,
    /// Voltage sense pin is not ADC-capable
    NotAnAdcPin(u8),
    /// Pin number out of range
    InvalidPin(u8),
    /// Same pin assigned twice
    PinConflict(u8),
    /// DMA channel out of range
    InvalidDmaChannel(u8),
}

impl GrinderConfig {
    /// Check internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        if t.charge_start >= t.charge_stop {
            return Err(ConfigError::ThresholdOrder);
        }
        if t.autogrind_stop_percent <= 100 {
            return Err(ConfigError::StopFactorTooLow);
        }

        let c = &self.control;
        if c.tap_timeout_ms == 0 || c.safety_stop_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if c.tap_timeout_ms >= c.safety_stop_ms {
            return Err(ConfigError::TapTimeoutTooLong);
        }

        let pins = self.pins.all();
        for (i, &pin) in pins.iter().enumerate() {
            if pin >= GPIO_COUNT {
                return Err(ConfigError::InvalidPin(pin));
            }
            if pins[..i].contains(&pin) {
                return Err(ConfigError::PinConflict(pin));
            }
        }
        if self.pins.voltage_adc_input().is_none() {
            return Err(ConfigError::NotAnAdcPin(self.pins.voltage_sense));
        }

        if self.sampling.dma_channel >= DMA_CHANNELS {
            return Err(ConfigError::InvalidDmaChannel(self.sampling.dma_channel));
        }

        Ok(())
    }
}
