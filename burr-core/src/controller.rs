//! Grinder controller
//!
//! Owns the board and exactly one active [`GrinderState`]. Each call to
//! [`GrinderController::run`] samples fresh inputs, evaluates the active
//! state once and, on a transition, applies the new state's entry action
//! before returning.

use crate::config::ControlConfig;
use crate::state::{GrinderState, Inputs, StateKind};
use crate::traits::{ButtonState, GrinderHardware, VoltageLimits, VoltageSample};

/// A state change reported by [`GrinderController::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    pub from: StateKind,
    pub to: StateKind,
}

/// Routes transition predicates through the board
struct BoardLimits<'a, H>(&'a H);

impl<H: GrinderHardware> VoltageLimits for BoardLimits<'_, H> {
    fn should_start_charging(&self, voltage: VoltageSample) -> bool {
        self.0.should_start_charging(voltage)
    }

    fn should_stop_charging(&self, voltage: VoltageSample) -> bool {
        self.0.should_stop_charging(voltage)
    }

    fn should_stop_grinding(&self, voltage: VoltageSample, start_voltage: VoltageSample) -> bool {
        self.0.should_stop_grinding(voltage, start_voltage)
    }
}

/// Finite-state grinder controller
pub struct GrinderController<H> {
    hw: H,
    control: ControlConfig,
    state: GrinderState,
    /// Voltage sampled on the last tick
    voltage: VoltageSample,
    /// Button state sampled on the last tick
    button: ButtonState,
}

impl<H: GrinderHardware> GrinderController<H> {
    /// Create a controller in `Idle` and apply the idle entry action
    pub fn new(hw: H, control: ControlConfig) -> Self {
        let mut controller = Self {
            hw,
            control,
            state: GrinderState::Idle,
            voltage: 0,
            button: ButtonState::Released,
        };
        controller.enter_state();
        controller
    }

    /// Run one control tick
    ///
    /// Inputs are re-read on every call, even when no transition is
    /// possible, so the debouncer and filters keep seeing fresh samples.
    pub fn run(&mut self) -> Option<Transition> {
        self.voltage = self.hw.read_voltage();
        self.button = self.hw.read_button_state();

        let inputs = Inputs {
            button: self.button,
            voltage: self.voltage,
            now: self.hw.now(),
        };

        let next = self.state.next(&inputs, &BoardLimits(&self.hw), &self.control)?;
        let from = self.state.kind();
        self.state = next;
        self.enter_state();

        Some(Transition {
            from,
            to: next.kind(),
        })
    }

    fn enter_state(&mut self) {
        let action = self.state.entry_action();
        if let Some(jack) = action.jack {
            self.hw.set_jack_state(jack);
        }
        if let Some(motor) = action.motor {
            self.hw.set_motor_state(motor);
        }
    }

    /// Active state
    pub fn state(&self) -> &GrinderState {
        &self.state
    }

    /// Voltage sampled on the last tick
    pub fn voltage(&self) -> VoltageSample {
        self.voltage
    }

    /// Button state sampled on the last tick
    pub fn button_state(&self) -> ButtonState {
        self.button
    }

    /// Borrow the board
    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Mutably borrow the board
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }
}
