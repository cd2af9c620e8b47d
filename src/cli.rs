//! CLI definitions for vcp-bridge.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// vcp-bridge CLI.
#[derive(Parser)]
#[command(name = "vcp-bridge")]
#[command(about = "Bridge a browser to a VCP automation server")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    /// Settings file (default: ~/.vcp-bridge/settings.json)
    #[arg(long, global = true, env = "VCP_BRIDGE_SETTINGS")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Connect to the server and serve commands (default)
    Run(RunArgs),

    /// Print the active page once, as the server would see it
    Snapshot {
        /// Open this URL first
        #[arg(long)]
        url: Option<String>,

        /// Chrome DevTools endpoint
        #[arg(long)]
        cdp_endpoint: Option<String>,
    },

    /// Persisted settings (serverUrl, vcpKey)
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(clap::Args, Default)]
pub(crate) struct RunArgs {
    /// Server base URL, e.g. ws://localhost:8088
    #[arg(long)]
    pub server_url: Option<String>,

    /// Access key
    #[arg(long)]
    pub key: Option<String>,

    /// Chrome DevTools endpoint
    #[arg(long)]
    pub cdp_endpoint: Option<String>,
}

#[derive(Subcommand)]
pub(crate) enum SettingsAction {
    /// Print one value
    Get {
        key: String,
    },

    /// Store a value
    Set {
        key: String,
        value: String,
    },

    /// Remove a value
    Unset {
        key: String,
    },

    /// Print every stored value
    List,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_no_subcommand() {
        let cli = Cli::try_parse_from(["vcp-bridge"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("config/default.toml"));
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::try_parse_from([
            "vcp-bridge",
            "run",
            "--server-url",
            "ws://10.0.0.2:8088",
            "--key",
            "k",
            "--cdp-endpoint",
            "http://localhost:9333",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.server_url.as_deref(), Some("ws://10.0.0.2:8088"));
                assert_eq!(args.key.as_deref(), Some("k"));
                assert_eq!(args.cdp_endpoint.as_deref(), Some("http://localhost:9333"));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_settings_set() {
        let cli =
            Cli::try_parse_from(["vcp-bridge", "settings", "set", "vcpKey", "secret"]).unwrap();
        match cli.command {
            Some(Commands::Settings {
                action: SettingsAction::Set { key, value },
            }) => {
                assert_eq!(key, "vcpKey");
                assert_eq!(value, "secret");
            }
            _ => panic!("expected settings set"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["vcp-bridge", "snapshot", "-c", "/tmp/bridge.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("/tmp/bridge.toml"));
    }
}
