use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The backing file could not be read or written. Fatal: the in-memory
    /// set must never run ahead of the file.
    #[error("membership store unavailable: failed to {operation} {}: {source}", path.display())]
    StorageUnavailable {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid room ID {room:?}: {reason}")]
    InvalidRoomId { room: String, reason: &'static str },
}

impl Error {
    #[must_use]
    pub fn storage(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::StorageUnavailable {
            operation,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
