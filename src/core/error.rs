use thiserror::Error;

use crate::core::types::Position;

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid map: {0}")]
    InvalidMap(String),

    #[error("Position out of bounds: {0:?}")]
    OutOfBounds(Position),

    #[error("Snapshot mismatch: {0}")]
    SnapshotMismatch(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, GuardError>;
