//! Hardware abstraction traits
//!
//! These traits define the interface between the application logic
//! and hardware-specific implementations.

pub mod adc_dma;
pub mod hardware;

pub use adc_dma::AdcDmaRegisters;
pub use hardware::{
    ButtonState, GrinderHardware, JackState, MotorState, VoltageLimits, VoltageSample,
    VoltageSource,
};
