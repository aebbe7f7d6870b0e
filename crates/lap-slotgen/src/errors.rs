//! Error types for the lap-slotgen commands
//!
//! Library errors from the manifest, slot and config crates are wrapped here so
//! each command reports a single error type.

use lap_config::ConfigError;
use lap_slots::{AllocationError, DocumentError};
use thiserror::Error;

/// Errors that abort `generate`; none of them leaves an output file behind
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("No services found in the input manifests")]
    NoServices,

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid {key} setting: {message}")]
    InvalidSetting { key: String, message: String },

    #[error("Invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
}

/// Errors from `inspect`
#[derive(Error, Debug)]
pub enum InspectError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("{0} consistency finding(s) in slot configuration")]
    Findings(usize),
}

/// Errors from `config`
#[derive(Error, Debug)]
pub enum ConfigCommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Unknown config key: {key}. Currently supported keys: {supported}")]
    UnknownKey { key: String, supported: String },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
