use std::fmt;
use std::io;
use std::path::PathBuf;

/// Error type for configuration and pin files
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read or written
    Io { path: PathBuf, source: io::Error },
    /// The file is not valid TOML for the expected layout
    Parse { path: PathBuf, message: String },
    /// The configuration could not be rendered as TOML
    Serialize(String),
    /// A file named on the command line does not exist
    NotFound(PathBuf),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Failed to access {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, message } => {
                write!(f, "Failed to parse {}: {}", path.display(), message)
            }
            ConfigError::Serialize(msg) => write!(f, "Failed to serialize config: {}", msg),
            ConfigError::NotFound(path) => write!(f, "File not found: {}", path.display()),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
