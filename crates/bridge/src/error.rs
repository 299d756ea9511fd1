use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The membership ledger could not be persisted.
    #[error(transparent)]
    Storage(#[from] jirabot_membership::Error),

    /// A transport call failed for good (not retryable, or retries exhausted).
    #[error("transport {operation} failed: {source}")]
    Transport {
        operation: String,
        #[source]
        source: jirabot_channels::Error,
    },
}

impl Error {
    #[must_use]
    pub fn transport(operation: impl Into<String>, source: jirabot_channels::Error) -> Self {
        Self::Transport {
            operation: operation.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
