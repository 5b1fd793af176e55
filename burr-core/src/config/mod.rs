//! Configuration types
//!
//! Board-agnostic configuration structures, built from the embedded
//! `grinder.toml` at boot or from defaults.

pub mod hardware;
pub mod parse;
pub mod types;

pub use hardware::*;
pub use parse::{parse_config, ParseError};
pub use types::*;
