//! Driver implementations for the grinder board
//!
//! This crate provides concrete implementations of the traits defined
//! in burr-core:
//!
//! - Button debouncing (time hysteresis)
//! - Fixed-point moving-average filter
//! - DMA-driven ADC averaging
//! - Active-high/low FET outputs
//! - [`board::GrinderBoard`], which composes all of the above into
//!   the `GrinderHardware` surface the controller consumes

#![no_std]
#![deny(unsafe_code)]

pub mod board;
pub mod filter;
pub mod input;
pub mod output;
pub mod sensor;

pub use board::GrinderBoard;
