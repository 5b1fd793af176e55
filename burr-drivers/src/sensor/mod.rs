//! Analog sensing

pub mod adc_dma;

pub use adc_dma::{AdcDmaAverager, Capture};
