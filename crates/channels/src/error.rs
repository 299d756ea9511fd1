use std::error::Error as StdError;

/// Crate-wide result type for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed transport errors shared by every transport implementation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The remote side refused the request (e.g. forbidden join). Retrying
    /// the same request will not help.
    #[error("transport request rejected: {operation}: {message}")]
    Rejected { operation: String, message: String },

    /// Operation is currently unavailable (rate limited, server error).
    #[error("transport operation unavailable: {operation}: {message}")]
    Unavailable { operation: String, message: String },

    /// Wrapped source error from an external dependency (network, decoding).
    #[error("transport operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn rejected(operation: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Rejected {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unavailable(operation: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Whether repeating the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_final() {
        assert!(!Error::rejected("join", "403 forbidden").is_retryable());
        assert!(Error::unavailable("send", "429 too many requests").is_retryable());
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(Error::external("sync", io).is_retryable());
    }

    #[test]
    fn display_names_the_operation() {
        let err = Error::rejected("join !abc:example.org", "M_FORBIDDEN");
        assert_eq!(
            err.to_string(),
            "transport request rejected: join !abc:example.org: M_FORBIDDEN"
        );
    }
}
