//! Reading smoothing

pub mod moving_average;
pub mod smoothed;

pub use moving_average::MovingAverage;
pub use smoothed::Smoothed;
