//! Configuration management for lap-slotgen
//!
//! Two files are handled here:
//! - the user configuration (`lap-slotgen.toml`) holding run defaults
//! - service pin files that fix identities, slot hints and categories per service

mod config;
mod error;
pub mod pins;

pub use config::{Config, CONFIG_ENV_VAR};
pub use error::ConfigError;
pub use pins::{PinFile, ServicePin};
