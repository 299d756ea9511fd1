//! Configuration loading, env substitution, and validation.
//!
//! Config files: `jirabot.toml`, `jirabot.yaml`, or `jirabot.json`
//! Searched in `./` then `~/.config/jirabot/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{config_dir, find_config_file, load, load_config},
    schema::{BotConfig, JiraAuthMode, JiraConfig, JirabotConfig, RetryConfig, ServerConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
