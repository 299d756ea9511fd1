use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    jirabot_bridge::{CommandParser, EventDispatcher, ReplyFormatter, RetryPolicy},
    jirabot_common::RoomId,
    jirabot_config::{JirabotConfig, Severity, ValidationResult},
    jirabot_jira::JiraClient,
    jirabot_matrix::MatrixClient,
    jirabot_membership::MembershipStore,
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "jirabot", about = "jirabot: Jira issue lookups for Matrix rooms", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: ./jirabot.toml, then ~/.config/jirabot/).
    #[arg(long, global = true, env = "JIRABOT_CONFIG")]
    config: Option<PathBuf>,

    /// Room membership ledger (overrides `bot.membership_file`).
    #[arg(long, global = true, env = "JIRABOT_MEMBERSHIP_FILE")]
    membership_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Also append logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Commands {
    /// Connect to Matrix and Jira and serve commands (default).
    Run,
    /// Load and validate the configuration, then exit.
    Check,
}

fn init_telemetry(cli: &Cli) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let file_layer = match &cli.log_file {
        Some(path) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(open_log_file(path)?)),
        ),
        None => None,
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
    Ok(())
}

fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

fn membership_path(cli: &Cli, config: &JirabotConfig) -> PathBuf {
    cli.membership_file
        .clone()
        .unwrap_or_else(|| config.bot.membership_file.clone())
}

fn static_rooms(config: &JirabotConfig) -> Vec<RoomId> {
    config
        .server
        .rooms
        .iter()
        .map(|room| RoomId::from(room.trim()))
        .collect()
}

fn log_diagnostics(report: &ValidationResult) {
    for diagnostic in &report.diagnostics {
        match diagnostic.severity {
            Severity::Error => error!(path = %diagnostic.path, "{}", diagnostic.message),
            Severity::Warning => warn!(path = %diagnostic.path, "{}", diagnostic.message),
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<(JirabotConfig, PathBuf)> {
    let (config, path) = jirabot_config::load(cli.config.as_deref())?;
    let report = jirabot_config::validate(&config);
    log_diagnostics(&report);
    report.into_result()?;
    info!(path = %path.display(), "configuration loaded");
    Ok((config, path))
}

fn check(cli: &Cli) -> anyhow::Result<()> {
    let (config, path) = jirabot_config::load(cli.config.as_deref())?;
    let report = jirabot_config::validate(&config);
    for diagnostic in &report.diagnostics {
        println!("{diagnostic}");
    }
    println!(
        "{}: {} error(s), {} warning(s)",
        path.display(),
        report.count(Severity::Error),
        report.count(Severity::Warning)
    );
    report.into_result()?;
    Ok(())
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let (config, _) = load_config(cli)?;

    let store_path = membership_path(cli, &config);
    let store = MembershipStore::load(&store_path)
        .with_context(|| format!("failed to load membership ledger {}", store_path.display()))?;
    info!(path = %store_path.display(), rooms = store.len(), "membership ledger loaded");

    let matrix = MatrixClient::login(&config.server)
        .await
        .context("matrix login failed")?
        .with_initial_backlog_skipped(config.bot.skip_initial_backlog);
    let jira = JiraClient::connect(&config.jira)
        .await
        .context("jira login failed")?;

    let mut dispatcher = EventDispatcher::new(Arc::new(matrix), Arc::new(jira), store)
        .with_parser(CommandParser::new(config.bot.trigger.clone()))
        .with_formatter(ReplyFormatter::new(config.bot.escape_html_summary))
        .with_retry(RetryPolicy::from(&config.retry));

    dispatcher.rejoin_recorded_rooms().await?;
    dispatcher.join_static_rooms(&static_rooms(&config)).await?;
    dispatcher.run().await?;
    info!("connection closed, jirabot exiting");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "jirabot starting");

    let result = match &cli.command {
        Some(Commands::Check) => check(&cli),
        None | Some(Commands::Run) => run(&cli).await,
    };
    if let Err(err) = &result {
        error!(error = %format!("{err:#}"), "jirabot stopped");
    }
    result
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_run() {
        let cli = Cli::try_parse_from(["jirabot"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.log_level, "info");
        assert!(!cli.json_logs);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "jirabot",
            "check",
            "--config",
            "/etc/jirabot.toml",
            "--json-logs",
        ])
        .unwrap();
        assert_eq!(cli.command, Some(Commands::Check));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/jirabot.toml")));
        assert!(cli.json_logs);
    }

    fn bare_cli() -> Cli {
        Cli {
            command: None,
            config: None,
            membership_file: None,
            log_level: "info".into(),
            json_logs: false,
            log_file: None,
        }
    }

    #[test]
    fn membership_file_defaults_to_config() {
        let mut config = JirabotConfig::default();
        assert_eq!(membership_path(&bare_cli(), &config), PathBuf::from("rooms.txt"));

        config.bot.membership_file = PathBuf::from("/srv/jirabot/rooms.txt");
        assert_eq!(
            membership_path(&bare_cli(), &config),
            PathBuf::from("/srv/jirabot/rooms.txt")
        );
    }

    #[test]
    fn membership_file_flag_wins() {
        let config = JirabotConfig::default();
        let cli = Cli::try_parse_from(["jirabot", "--membership-file", "/var/lib/jirabot/rooms"])
            .unwrap();
        assert_eq!(
            membership_path(&cli, &config),
            PathBuf::from("/var/lib/jirabot/rooms")
        );
    }

    #[test]
    fn static_rooms_are_trimmed() {
        let mut config = JirabotConfig::default();
        config.server.rooms = vec![" !a:example.org ".into(), "!b:example.org".into()];
        assert_eq!(static_rooms(&config), vec![
            RoomId::from("!a:example.org"),
            RoomId::from("!b:example.org"),
        ]);
    }

    #[test]
    fn log_file_is_created_with_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("jirabot.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }
}
