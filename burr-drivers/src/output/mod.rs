//! Actuator outputs

pub mod relay;

pub use relay::Relay;
