//! vcp-bridge - browser-side bridge for VCP automation servers.
//!
//! Main entry point: loads configuration, initializes tracing and dispatches
//! to the subcommand handlers.

mod cli;
mod cmd_run;
mod cmd_settings;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use vcp_bridge_config::{
    Config, ConfigLoader, ConfigValidator, FileSettingsStore, LoggingConfig, SettingsStore,
};

use crate::cli::{Cli, Commands, RunArgs};
use crate::cmd_settings::handle_settings_command;

/// Returns the vcp-bridge home directory (~/.vcp-bridge).
fn bridge_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".vcp-bridge"))
        .unwrap_or_else(|| PathBuf::from(".vcp-bridge"))
}

/// Initialize tracing with console and file output.
///
/// Log files are written to ~/.vcp-bridge/debug/ (or `logging.dir`) with
/// daily rotation.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let log_dir = match &logging.dir {
        Some(dir) => PathBuf::from(ConfigLoader::expand_path(dir)),
        None => bridge_dir().join("debug"),
    };
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("vcp-bridge")
        .filename_suffix("log")
        .max_log_files(14)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keeps the background writer alive for the whole process.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let file_layer = if logging.json {
        fmt::layer().json().with_writer(non_blocking).boxed()
    } else {
        fmt::layer().with_writer(non_blocking).with_ansi(false).boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(())
}

fn validate_config(config: &Config, path: &Path) -> Result<()> {
    let warnings = ConfigValidator::validate(config)
        .into_result()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    for warning in warnings {
        warn!("{}: {}", warning.path, warning.message);
    }
    Ok(())
}

fn open_settings(path: Option<PathBuf>) -> Result<FileSettingsStore> {
    let store = match path {
        Some(path) => FileSettingsStore::open(path)?,
        None => FileSettingsStore::default_path()?,
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    init_tracing(&config.logging)?;
    validate_config(&config, &cli.config)?;

    let settings = open_settings(cli.settings)?;

    match cli.command {
        None => cmd_run::run(&config, &settings, RunArgs::default()).await,
        Some(Commands::Run(args)) => cmd_run::run(&config, &settings, args).await,
        Some(Commands::Snapshot { url, cdp_endpoint }) => {
            cmd_run::snapshot(&config, url, cdp_endpoint).await
        }
        Some(Commands::Settings { action }) => {
            let store: &dyn SettingsStore = &settings;
            handle_settings_command(action, store, &mut std::io::stdout().lock())
        }
    }
}
