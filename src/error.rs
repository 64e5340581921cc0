use thiserror::Error;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum ChangeTrackError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Failed to list directory {path}: {source}")]
    Enumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid snapshot state: {0}")]
    State(String),

    #[error("State file {path} unavailable: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] globset::Error),
}

impl ChangeTrackError {
    /// Convert a walkdir failure while listing `path` into an enumeration error.
    pub fn enumeration(path: impl Into<PathBuf>, err: walkdir::Error) -> Self {
        let path = path.into();
        match err.into_io_error() {
            Some(source) => ChangeTrackError::Enumeration { path, source },
            None => ChangeTrackError::Enumeration {
                path,
                source: std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop detected"),
            },
        }
    }
}
