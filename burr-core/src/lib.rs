//! Board-agnostic core logic for the grinder firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Monotonic tick arithmetic
//! - Configuration types and the embedded config parser
//! - Grinder state set and transition rules
//! - The controller that drives the state machine
//! - Hardware abstraction traits (grinder board, voltage source, ADC/DMA registers)

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod controller;
pub mod state;
pub mod time;
pub mod traits;

pub use controller::{GrinderController, Transition};
pub use time::{Tick, TimeSource};
