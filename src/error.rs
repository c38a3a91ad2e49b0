use thiserror::Error;

/// Errors raised by the game engine itself.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// Construction-time misconfiguration. Always fatal.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An operation was called in a status that does not allow it.
    #[error("cannot {operation} while {status}")]
    InvalidState {
        operation: &'static str,
        status: crate::engine::Status,
    },
}

/// Durable storage failures. These never reach the host; the engine logs
/// and absorbs them.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("stored value for `{key}` is corrupt: {value:?}")]
    Corrupt { key: String, value: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Unavailable(err.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Unavailable(err.to_string())
    }
}
