use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Jira refused the configured credentials.
    #[error("jira rejected credentials for {username} (HTTP {status})")]
    Auth { username: String, status: u16 },

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error("jira returned HTTP {status} for {operation}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode jira {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: reqwest::Error,
    },
}

impl Error {
    #[must_use]
    pub fn decode(what: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Decode {
            what: what.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
