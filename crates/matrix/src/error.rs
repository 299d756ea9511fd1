use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The homeserver refused the login.
    #[error("matrix login rejected for {username} (HTTP {status}): {message}")]
    Auth {
        username: String,
        status: u16,
        message: String,
    },

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error("matrix returned HTTP {status} for {operation}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },
}

impl Error {
    /// Map onto the transport error taxonomy: rate limits and server errors
    /// may clear up, other client errors will not.
    #[must_use]
    pub fn into_transport(self, operation: &str) -> jirabot_channels::Error {
        match self {
            Self::Status { status, body, .. } if status == 429 || status >= 500 => {
                jirabot_channels::Error::unavailable(operation, format!("HTTP {status}: {body}"))
            },
            Self::Status { status, body, .. } => {
                jirabot_channels::Error::rejected(operation, format!("HTTP {status}: {body}"))
            },
            Self::Auth { message, .. } => jirabot_channels::Error::rejected(operation, message),
            Self::Reqwest(source) => jirabot_channels::Error::external(operation, source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
