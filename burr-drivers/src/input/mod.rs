//! Digital input conditioning

pub mod debounce;

pub use debounce::Debouncer;
