//! Grinder board traits
//!
//! [`GrinderHardware`] is the single capability surface the controller
//! consumes: filtered inputs, actuator commands and threshold predicates.

use crate::config::VoltageThresholds;
use crate::time::TimeSource;

/// Averaged battery voltage reading in raw 12-bit ADC units
///
/// Held in a 16-bit word; accumulation happens in wider integers.
pub type VoltageSample = u16;

/// Debounced grind button state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonState {
    /// Button held down
    Pressed,
    /// Button up
    #[default]
    Released,
}

impl ButtonState {
    /// Check if the button is pressed
    pub fn is_pressed(self) -> bool {
        self == ButtonState::Pressed
    }
}

/// Commanded motor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorState {
    /// Motor FET on
    Running,
    /// Motor FET off
    #[default]
    Stopped,
}

/// Commanded charging-jack solenoid state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JackState {
    /// Jack connected, battery charging
    Enabled,
    /// Jack disconnected
    #[default]
    Disabled,
}

/// Source of filtered battery voltage readings
///
/// Every reading is already averaged or smoothed; raw single
/// conversions never leave an implementation of this trait.
pub trait VoltageSource {
    /// Produce the next filtered reading
    fn read_voltage(&mut self) -> VoltageSample;
}

impl<V: VoltageSource + ?Sized> VoltageSource for &mut V {
    fn read_voltage(&mut self) -> VoltageSample {
        (**self).read_voltage()
    }
}

/// Battery voltage predicates driving the state transitions
pub trait VoltageLimits {
    /// Battery low enough to connect the charger
    fn should_start_charging(&self, voltage: VoltageSample) -> bool;

    /// Battery full enough to disconnect the charger
    fn should_stop_charging(&self, voltage: VoltageSample) -> bool;

    /// Voltage recovered enough since `start_voltage` to end auto-grind
    fn should_stop_grinding(&self, voltage: VoltageSample, start_voltage: VoltageSample) -> bool;
}

impl VoltageLimits for VoltageThresholds {
    fn should_start_charging(&self, voltage: VoltageSample) -> bool {
        VoltageThresholds::should_start_charging(self, voltage)
    }

    fn should_stop_charging(&self, voltage: VoltageSample) -> bool {
        VoltageThresholds::should_stop_charging(self, voltage)
    }

    fn should_stop_grinding(&self, voltage: VoltageSample, start_voltage: VoltageSample) -> bool {
        VoltageThresholds::should_stop_grinding(self, voltage, start_voltage)
    }
}

/// Everything the grinder controller needs from the board
///
/// The controller evaluates transitions through the `should_*`
/// predicates, so a board may override them.
pub trait GrinderHardware: TimeSource {
    /// Read the filtered battery voltage
    ///
    /// Implementations backed by DMA captures re-arm the next capture
    /// before returning, so callers never manage the capture lifecycle.
    fn read_voltage(&mut self) -> VoltageSample;

    /// Read the debounced button state
    fn read_button_state(&mut self) -> ButtonState;

    /// Command the motor output
    fn set_motor_state(&mut self, state: MotorState);

    /// Command the charging-jack output
    fn set_jack_state(&mut self, state: JackState);

    /// Voltage thresholds used by the predicates below
    fn thresholds(&self) -> &VoltageThresholds;

    /// See [`VoltageThresholds::should_start_charging`]
    fn should_start_charging(&self, voltage: VoltageSample) -> bool {
        self.thresholds().should_start_charging(voltage)
    }

    /// See [`VoltageThresholds::should_stop_charging`]
    fn should_stop_charging(&self, voltage: VoltageSample) -> bool {
        self.thresholds().should_stop_charging(voltage)
    }

    /// See [`VoltageThresholds::should_stop_grinding`]
    fn should_stop_grinding(&self, voltage: VoltageSample, start_voltage: VoltageSample) -> bool {
        self.thresholds().should_stop_grinding(voltage, start_voltage)
    }
}
