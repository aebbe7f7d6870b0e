use crate::pools::Pool;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while assigning a registry slot to a service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("{pool} slot pool exhausted for {service}")]
    PoolExhausted { service: String, pool: Pool },

    #[error("static slot {slot} for {service} is already held by {holder}")]
    StaticCollision {
        service: String,
        slot: u16,
        holder: String,
    },
}

/// Errors raised while building, writing or reading a slot configuration document
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Service '{0}' has no slot assigned")]
    Unallocated(String),

    #[error("Invalid entry for '{service}': {reason}")]
    InvalidEntry { service: String, reason: String },
}
