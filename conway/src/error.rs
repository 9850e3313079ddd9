// error.rs - Error type shared by every module of the library

use crate::backend::BufferHandle;

pub type Result<T, E = LifeError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum LifeError {
    /// The compute/render backend could not be created.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("dimension mismatch: expected {expected} cells, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("cell {index} holds {value}, cells must be 0 or 1")]
    NonBinaryCell { index: usize, value: u32 },

    #[error("unknown buffer {0:?}")]
    UnknownBuffer(BufferHandle),

    /// A dispatch named the same buffer as both input and output.
    #[error("buffer {0:?} used for both reading and writing in one dispatch")]
    AliasedBuffers(BufferHandle),

    #[error("invalid rule {0:?}, expected notation like B3/S23")]
    InvalidRule(String),

    #[error("invalid pattern placement {0:?}, expected name@x,y with a known shape")]
    InvalidPattern(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to present frame: {0}")]
    Present(String),

    #[error("ticker task failed: {0}")]
    Ticker(#[from] tokio::task::JoinError),
}
