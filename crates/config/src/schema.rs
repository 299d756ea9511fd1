//! Config schema types for the Matrix server, the Jira tracker, the bot
//! itself, and the transport retry policy.
use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JirabotConfig {
    pub server: ServerConfig,
    pub jira: JiraConfig,
    pub bot: BotConfig,
    pub retry: RetryConfig,
}

/// Matrix homeserver account.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Homeserver base URL, e.g. `https://matrix.example.org`.
    pub hostname: String,

    /// Localpart or full user ID of the bot account.
    pub username: String,

    pub password: Secret<String>,

    /// Rooms joined at startup regardless of the persisted membership file.
    pub rooms: Vec<String>,

    /// Long-poll timeout for `/sync` (ms).
    pub sync_timeout_ms: u64,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("rooms", &self.rooms)
            .field("sync_timeout_ms", &self.sync_timeout_ms)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            username: String::new(),
            password: Secret::new(String::new()),
            rooms: Vec::new(),
            sync_timeout_ms: 30_000,
        }
    }
}

impl ServerConfig {
    pub fn base_url(&self) -> String {
        normalize_base_url(&self.hostname)
    }

    pub fn has_password(&self) -> bool {
        !self.password.expose_secret().is_empty()
    }
}

/// How the Jira client authenticates.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JiraAuthMode {
    /// Log in once via `/rest/auth/1/session` and send the session cookie.
    #[default]
    Session,
    /// Send HTTP basic credentials on every request.
    Basic,
}

/// Jira tracker account.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    pub hostname: String,
    pub username: String,
    pub password: Secret<String>,
    pub auth: JiraAuthMode,
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for JiraConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraConfig")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            username: String::new(),
            password: Secret::new(String::new()),
            auth: JiraAuthMode::default(),
            request_timeout_secs: 30,
        }
    }
}

impl JiraConfig {
    pub fn base_url(&self) -> String {
        normalize_base_url(&self.hostname)
    }

    pub fn has_password(&self) -> bool {
        !self.password.expose_secret().is_empty()
    }
}

/// Bot behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Token that marks a message as a bot command.
    pub trigger: String,

    /// Path of the persisted room membership ledger.
    pub membership_file: PathBuf,

    /// Drop messages delivered by the very first sync (stale commands).
    pub skip_initial_backlog: bool,

    /// HTML-escape issue summaries in the formatted reply body.
    pub escape_html_summary: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            trigger: "!jira".into(),
            membership_file: PathBuf::from("rooms.txt"),
            skip_initial_backlog: true,
            escape_html_summary: false,
        }
    }
}

/// Bounded retry with exponential backoff for transport calls.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
        }
    }
}

/// Prefix `https://` when the hostname carries no scheme and drop trailing
/// slashes.
pub fn normalize_base_url(hostname: &str) -> String {
    let trimmed = hostname.trim().trim_end_matches('/');
    if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

pub(crate) fn has_http_scheme(hostname: &str) -> bool {
    let lower = hostname.trim().to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}
