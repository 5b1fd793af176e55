//! RP2040-specific HAL for the grinder firmware
//!
//! Implements the burr-core hardware traits on the RP2040:
//!
//! - ADC free-running capture into a DMA channel, with the sniffer as
//!   a hardware sum accumulator
//! - Millisecond clock on top of the embassy time driver
//! - Dynamic pin allocation for config-driven setup

#![no_std]

pub mod adc_dma;
pub mod clock;
pub mod pins;

pub use adc_dma::Rp2040AdcDma;
pub use clock::EmbassyClock;
pub use pins::{PinBank, PinError, RemainingPeripherals};
