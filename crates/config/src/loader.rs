use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::JirabotConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "jirabot.toml",
    "jirabot.yaml",
    "jirabot.yml",
    "jirabot.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<JirabotConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Load config from an explicit path, or discover it in standard locations.
///
/// Search order when `explicit` is `None`:
/// 1. `./jirabot.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/jirabot/jirabot.{toml,yaml,yml,json}` (user-global)
///
/// Credentials are mandatory, so a missing file is an error.
pub fn load(explicit: Option<&Path>) -> Result<(JirabotConfig, PathBuf)> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => find_config_file().ok_or_else(|| Error::NotFound {
            searched: search_locations()
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })?,
    };
    debug!(path = %path.display(), "loading config");
    let config = load_config(&path)?;
    Ok((config, path))
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    search_locations().into_iter().find(|p| p.exists())
}

fn search_locations() -> Vec<PathBuf> {
    let mut locations: Vec<PathBuf> = CONFIG_FILENAMES.iter().map(PathBuf::from).collect();
    if let Some(dir) = config_dir() {
        locations.extend(CONFIG_FILENAMES.iter().map(|name| dir.join(name)));
    }
    locations
}

/// Returns the user-global config directory (`~/.config/jirabot/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "jirabot").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> Result<JirabotConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse(path, e)),
        _ => Err(Error::UnsupportedFormat {
            ext: ext.to_string(),
        }),
    }
}
