//! Configuration validation.
//!
//! Checks the loaded configuration for missing credentials and values the
//! runtime cannot work with, reporting every problem in one pass.

use crate::{
    error::{Error, Result},
    schema::{JirabotConfig, has_http_scheme},
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "server.hostname"
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.severity, self.path, self.message)
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Collapse error diagnostics into a [`Error::Invalid`].
    pub fn into_result(self) -> Result<()> {
        if !self.has_errors() {
            return Ok(());
        }
        let summary = self
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| format!("{}: {}", d.path, d.message))
            .collect::<Vec<_>>()
            .join("; ");
        Err(Error::Invalid { summary })
    }

    fn error(&mut self, path: &str, message: impl Into<String>) {
        self.push(Severity::Error, path, message);
    }

    fn warning(&mut self, path: &str, message: impl Into<String>) {
        self.push(Severity::Warning, path, message);
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.to_string(),
            message: message.into(),
        });
    }
}

/// Validate a loaded configuration.
pub fn validate(config: &JirabotConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    check_account(
        &mut result,
        "server",
        &config.server.hostname,
        &config.server.username,
        config.server.has_password(),
    );
    check_account(
        &mut result,
        "jira",
        &config.jira.hostname,
        &config.jira.username,
        config.jira.has_password(),
    );

    for (i, room) in config.server.rooms.iter().enumerate() {
        if room.trim().is_empty() {
            result.error(&format!("server.rooms[{i}]"), "room ID is empty");
        }
    }

    let trigger = &config.bot.trigger;
    if trigger.is_empty() {
        result.error("bot.trigger", "trigger token is empty");
    } else if trigger.chars().any(char::is_whitespace) {
        result.error("bot.trigger", "trigger token must not contain whitespace");
    }

    if config.bot.membership_file.as_os_str().is_empty() {
        result.error("bot.membership_file", "membership file path is empty");
    }

    if config.retry.max_attempts == 0 {
        result.error("retry.max_attempts", "must be at least 1");
    }
    if config.retry.base_delay_ms > config.retry.max_delay_ms {
        result.error(
            "retry.base_delay_ms",
            format!(
                "base delay ({}ms) exceeds max delay ({}ms)",
                config.retry.base_delay_ms, config.retry.max_delay_ms
            ),
        );
    }

    if config.jira.request_timeout_secs == 0 {
        result.warning(
            "jira.request_timeout_secs",
            "0 disables the lookup timeout",
        );
    }

    result
}

fn check_account(
    result: &mut ValidationResult,
    section: &str,
    hostname: &str,
    username: &str,
    has_password: bool,
) {
    if hostname.trim().is_empty() {
        result.error(&format!("{section}.hostname"), "hostname is required");
    } else if !has_http_scheme(hostname) {
        result.warning(
            &format!("{section}.hostname"),
            format!("no scheme given, assuming https://{}", hostname.trim()),
        );
    }
    if username.trim().is_empty() {
        result.error(&format!("{section}.username"), "username is required");
    }
    if !has_password {
        result.error(&format!("{section}.password"), "password is required");
    }
    for (field, value) in [("hostname", hostname), ("username", username)] {
        if value.contains("${") {
            result.warning(
                &format!("{section}.{field}"),
                "contains an unresolved ${...} placeholder",
            );
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn complete_config() -> JirabotConfig {
        toml::from_str(
            r#"
            [server]
            hostname = "https://matrix.example.org"
            username = "jirabot"
            password = "secret"

            [jira]
            hostname = "https://jira.example.org"
            username = "bot"
            password = "secret"
            "#,
        )
        .unwrap()
    }

    fn paths(result: &ValidationResult, severity: Severity) -> Vec<&str> {
        result
            .diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .map(|d| d.path.as_str())
            .collect()
    }

    #[test]
    fn complete_config_is_valid() {
        let result = validate(&complete_config());
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
        assert!(result.into_result().is_ok());
    }

    #[test]
    fn empty_config_reports_every_missing_credential() {
        let result = validate(&JirabotConfig::default());
        let errors = paths(&result, Severity::Error);
        for expected in [
            "server.hostname",
            "server.username",
            "server.password",
            "jira.hostname",
            "jira.username",
            "jira.password",
        ] {
            assert!(errors.contains(&expected), "missing {expected}: {errors:?}");
        }
        assert_eq!(result.count(Severity::Error), 6);
    }

    #[test]
    fn invalid_result_summarizes_errors() {
        let err = validate(&JirabotConfig::default())
            .into_result()
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("server.hostname"));
        assert!(msg.contains("jira.password"));
    }

    #[test]
    fn hostname_without_scheme_is_a_warning() {
        let mut cfg = complete_config();
        cfg.server.hostname = "matrix.example.org".into();
        let result = validate(&cfg);
        assert!(!result.has_errors());
        assert_eq!(paths(&result, Severity::Warning), vec!["server.hostname"]);
    }

    #[test]
    fn trigger_with_whitespace_is_rejected() {
        let mut cfg = complete_config();
        cfg.bot.trigger = "! jira".into();
        assert_eq!(paths(&validate(&cfg), Severity::Error), vec!["bot.trigger"]);
    }

    #[test]
    fn retry_bounds_are_checked() {
        let mut cfg = complete_config();
        cfg.retry.max_attempts = 0;
        cfg.retry.base_delay_ms = 10_000;
        cfg.retry.max_delay_ms = 100;
        assert_eq!(
            paths(&validate(&cfg), Severity::Error),
            vec!["retry.max_attempts", "retry.base_delay_ms"]
        );
    }

    #[test]
    fn blank_static_room_is_rejected() {
        let mut cfg = complete_config();
        cfg.server.rooms = vec!["!ok:example.org".into(), "  ".into()];
        assert_eq!(
            paths(&validate(&cfg), Severity::Error),
            vec!["server.rooms[1]"]
        );
    }
}
