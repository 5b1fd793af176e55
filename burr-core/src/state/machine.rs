//! State machine definition
//!
//! Each state carries only the data its own transition rule needs.
//! A state value is created by a transition, lives while it is active
//! and is replaced wholesale by the next one.

use crate::config::{AutoGrindStopPolicy, ControlConfig};
use crate::time::Tick;
use crate::traits::{ButtonState, JackState, MotorState, VoltageLimits, VoltageSample};

/// Grinder states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GrinderState {
    /// Motor off, jack off, waiting for a press
    #[default]
    Idle,
    /// Button just pressed, motor running; tap or hold not yet decided
    GrindBegin {
        /// When the motor was started
        started: Tick,
    },
    /// Tap detected, grinding unattended until the voltage recovers
    AutoGrind {
        /// When the motor was started (carried over from `GrindBegin`)
        started: Tick,
        /// Battery voltage when auto-grind began
        start_voltage: VoltageSample,
    },
    /// Button pressed during auto-grind; motor off until release
    AutoGrindStop,
    /// Button held past the tap timeout, grinding while held
    ManualGrind,
    /// Battery low, jack enabled
    Charging,
}

/// State names without their data, for logging and assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StateKind {
    Idle,
    GrindBegin,
    AutoGrind,
    AutoGrindStop,
    ManualGrind,
    Charging,
}

/// Inputs sampled once per controller tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Inputs {
    /// Debounced button state
    pub button: ButtonState,
    /// Filtered battery voltage
    pub voltage: VoltageSample,
    /// Current time
    pub now: Tick,
}

/// Actuator commands issued when a state is entered
///
/// `None` leaves the output at its previous command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EntryAction {
    pub jack: Option<JackState>,
    pub motor: Option<MotorState>,
}

impl GrinderState {
    /// State name
    pub fn kind(&self) -> StateKind {
        match self {
            GrinderState::Idle => StateKind::Idle,
            GrinderState::GrindBegin { .. } => StateKind::GrindBegin,
            GrinderState::AutoGrind { .. } => StateKind::AutoGrind,
            GrinderState::AutoGrindStop => StateKind::AutoGrindStop,
            GrinderState::ManualGrind => StateKind::ManualGrind,
            GrinderState::Charging => StateKind::Charging,
        }
    }

    /// Check if the motor is commanded on in this state
    pub fn motor_running(&self) -> bool {
        matches!(
            self,
            GrinderState::GrindBegin { .. } | GrinderState::AutoGrind { .. } | GrinderState::ManualGrind
        )
    }

    /// Commands to apply on entry
    pub fn entry_action(&self) -> EntryAction {
        match self {
            GrinderState::Idle => EntryAction {
                jack: Some(JackState::Disabled),
                motor: Some(MotorState::Stopped),
            },
            GrinderState::GrindBegin { .. } => EntryAction {
                jack: Some(JackState::Disabled),
                motor: Some(MotorState::Running),
            },
            GrinderState::AutoGrindStop => EntryAction {
                jack: None,
                motor: Some(MotorState::Stopped),
            },
            GrinderState::Charging => EntryAction {
                jack: Some(JackState::Enabled),
                motor: Some(MotorState::Stopped),
            },
            GrinderState::AutoGrind { .. } | GrinderState::ManualGrind => EntryAction::default(),
        }
    }

    /// Evaluate this state's transition rule once
    ///
    /// Returns the next state, fully initialised from `inputs`, or `None`
    /// to stay. At most one transition is produced per call.
    pub fn next<L: VoltageLimits + ?Sized>(
        &self,
        inputs: &Inputs,
        limits: &L,
        control: &ControlConfig,
    ) -> Option<GrinderState> {
        let pressed = inputs.button.is_pressed();

        match *self {
            GrinderState::Idle => {
                if pressed {
                    Some(GrinderState::GrindBegin { started: inputs.now })
                } else if limits.should_start_charging(inputs.voltage) {
                    Some(GrinderState::Charging)
                } else {
                    None
                }
            }

            GrinderState::GrindBegin { started } => {
                let held_ms = inputs.now.millis_since(started);
                if held_ms < control.tap_timeout_ms && !pressed {
                    Some(GrinderState::AutoGrind {
                        started,
                        start_voltage: inputs.voltage,
                    })
                } else if held_ms >= control.tap_timeout_ms {
                    Some(GrinderState::ManualGrind)
                } else {
                    None
                }
            }

            GrinderState::AutoGrind {
                started,
                start_voltage,
            } => {
                if pressed {
                    Some(match control.stop_policy {
                        AutoGrindStopPolicy::ManualGrind => GrinderState::ManualGrind,
                        AutoGrindStopPolicy::StopFirst => GrinderState::AutoGrindStop,
                    })
                } else if limits.should_stop_grinding(inputs.voltage, start_voltage) {
                    Some(GrinderState::Idle)
                } else if inputs.now.millis_since(started) > control.safety_stop_ms {
                    Some(GrinderState::Idle)
                } else {
                    None
                }
            }

            GrinderState::AutoGrindStop | GrinderState::ManualGrind => {
                if pressed {
                    None
                } else {
                    Some(GrinderState::Idle)
                }
            }

            GrinderState::Charging => {
                if pressed {
                    Some(GrinderState::GrindBegin { started: inputs.now })
                } else if limits.should_stop_charging(inputs.voltage) {
                    Some(GrinderState::Idle)
                } else {
                    None
                }
            }
        }
    }
}
