//! Grinder state machine
//!
//! The state set is explicit, finite and deterministic. Transition
//! evaluation is a pure function of the active state, the inputs sampled
//! this tick and the configuration; entry actions are returned as data
//! for the controller to apply.

pub mod machine;

pub use machine::{EntryAction, GrinderState, Inputs, StateKind};
