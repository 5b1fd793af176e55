//! Grinder board
//!
//! Composes the button debouncer, the two switched outputs, a filtered
//! voltage source and a clock into the single [`GrinderHardware`]
//! surface the controller drives.

use core::convert::Infallible;

use burr_core::config::{GrinderConfig, VoltageThresholds};
use burr_core::traits::{
    ButtonState, GrinderHardware, JackState, MotorState, VoltageSample, VoltageSource,
};
use burr_core::{Tick, TimeSource};
use embedded_hal::digital::{InputPin, OutputPin};

use crate::input::Debouncer;
use crate::output::Relay;

/// Concrete grinder board
///
/// - `B`: grind button input
/// - `M`, `J`: motor and charging-jack outputs
/// - `V`: filtered battery voltage
/// - `C`: monotonic clock
pub struct GrinderBoard<B, M, J, V, C> {
    button: B,
    /// Button reads low when pressed
    button_active_low: bool,
    debouncer: Debouncer<bool>,
    motor: Relay<M>,
    jack: Relay<J>,
    voltage: V,
    clock: C,
    thresholds: VoltageThresholds,
}

impl<B, M, J, V, C> GrinderBoard<B, M, J, V, C>
where
    B: InputPin<Error = Infallible>,
    M: OutputPin<Error = Infallible>,
    J: OutputPin<Error = Infallible>,
    V: VoltageSource,
    C: TimeSource,
{
    /// Assemble a board; button polarity, debounce time and thresholds
    /// come from `config`
    pub fn new(
        button: B,
        motor: Relay<M>,
        jack: Relay<J>,
        voltage: V,
        clock: C,
        config: &GrinderConfig,
    ) -> Self {
        let debouncer = Debouncer::new(false, clock.now(), config.debounce_ms);
        Self {
            button,
            button_active_low: config.pins.button.inverted,
            debouncer,
            motor,
            jack,
            voltage,
            clock,
            thresholds: config.thresholds,
        }
    }

    /// Commanded motor state
    pub fn motor_state(&self) -> MotorState {
        if self.motor.is_energized() {
            MotorState::Running
        } else {
            MotorState::Stopped
        }
    }

    /// Commanded jack state
    pub fn jack_state(&self) -> JackState {
        if self.jack.is_energized() {
            JackState::Enabled
        } else {
            JackState::Disabled
        }
    }

    /// The voltage source, e.g. for capture diagnostics
    pub fn voltage_source(&self) -> &V {
        &self.voltage
    }
}

impl<B, M, J, V, C: TimeSource> TimeSource for GrinderBoard<B, M, J, V, C> {
    fn now(&self) -> Tick {
        self.clock.now()
    }
}

impl<B, M, J, V, C> GrinderHardware for GrinderBoard<B, M, J, V, C>
where
    B: InputPin<Error = Infallible>,
    M: OutputPin<Error = Infallible>,
    J: OutputPin<Error = Infallible>,
    V: VoltageSource,
    C: TimeSource,
{
    fn read_voltage(&mut self) -> VoltageSample {
        self.voltage.read_voltage()
    }

    fn read_button_state(&mut self) -> ButtonState {
        let high = self.button.is_high().unwrap_or_else(|e| match e {});
        let pressed = self.debouncer.observe(high != self.button_active_low, self.clock.now());

        if pressed {
            ButtonState::Pressed
        } else {
            ButtonState::Released
        }
    }

    fn set_motor_state(&mut self, state: MotorState) {
        self.motor.set(state == MotorState::Running);
    }

    fn set_jack_state(&mut self, state: JackState) {
        self.jack.set(state == JackState::Enabled);
    }

    fn thresholds(&self) -> &VoltageThresholds {
        &self.thresholds
    }
}
