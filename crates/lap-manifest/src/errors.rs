use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a service manifest document
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed manifest: {0}")]
    Parse(#[from] roxmltree::Error),
}
