// Error types for loading property sources

use thiserror::Error;

/// Failure while filling a property source.
///
/// Lookups never produce these; only loading files or the environment does.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load properties: {0}")]
    LoadError(String),

    #[error("Failed to parse properties: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
