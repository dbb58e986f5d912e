use thiserror::Error;

/// Top-level error type for the carebot system.
///
/// Subsystem crates define their own error types and implement
/// `From<CarebotError>` so that `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CarebotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Roster error: {0}")]
    Roster(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for CarebotError {
    fn from(err: toml::de::Error) -> Self {
        CarebotError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CarebotError {
    fn from(err: toml::ser::Error) -> Self {
        CarebotError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CarebotError {
    fn from(err: serde_json::Error) -> Self {
        CarebotError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for carebot operations.
pub type Result<T> = std::result::Result<T, CarebotError>;
