//! Settings subcommand handlers.

use std::io::Write;

use anyhow::{bail, Result};
use tracing::warn;

use vcp_bridge_config::{SettingsStore, KEY_SERVER_URL, KEY_VCP_KEY};
use vcp_bridge_protocols::{endpoint_url, Channel};

use crate::cli::SettingsAction;

const KNOWN_KEYS: [&str; 2] = [KEY_SERVER_URL, KEY_VCP_KEY];

/// Handle settings subcommands, writing human output to `out`.
pub(crate) fn handle_settings_command(
    action: SettingsAction,
    store: &dyn SettingsStore,
    out: &mut dyn Write,
) -> Result<()> {
    match action {
        SettingsAction::Get { key } => match store.get(&key) {
            Some(value) => writeln!(out, "{}", value)?,
            None => bail!("'{}' is not set", key),
        },
        SettingsAction::Set { key, value } => {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                warn!("'{}' is not read by the bridge", key);
            }
            if key == KEY_SERVER_URL {
                // Reject URLs the connection would refuse later anyway.
                endpoint_url(&value, Channel::Observer, "")?;
            }
            store.set(&key, &value)?;
            writeln!(out, "{} = {}", key, value)?;
        }
        SettingsAction::Unset { key } => match store.remove(&key)? {
            Some(_) => writeln!(out, "Removed {}", key)?,
            None => writeln!(out, "{} was not set", key)?,
        },
        SettingsAction::List => {
            let entries = store.list();
            if entries.is_empty() {
                writeln!(out, "No settings stored.")?;
            }
            for (key, value) in entries {
                writeln!(out, "{:<12} {}", key, value)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcp_bridge_config::{FileSettingsStore, MemorySettingsStore};

    fn run(action: SettingsAction, store: &dyn SettingsStore) -> Result<String> {
        let mut out = Vec::new();
        handle_settings_command(action, store, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_set_then_get() {
        let store = MemorySettingsStore::new();
        let out = run(
            SettingsAction::Set {
                key: KEY_VCP_KEY.to_string(),
                value: "secret".to_string(),
            },
            &store,
        )
        .unwrap();
        assert_eq!(out, "vcpKey = secret\n");

        let out = run(
            SettingsAction::Get {
                key: KEY_VCP_KEY.to_string(),
            },
            &store,
        )
        .unwrap();
        assert_eq!(out, "secret\n");
    }

    #[test]
    fn test_get_missing_fails() {
        let store = MemorySettingsStore::new();
        let err = run(
            SettingsAction::Get {
                key: KEY_SERVER_URL.to_string(),
            },
            &store,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn test_set_rejects_bad_server_url() {
        let store = MemorySettingsStore::new();
        let result = run(
            SettingsAction::Set {
                key: KEY_SERVER_URL.to_string(),
                value: "not a url".to_string(),
            },
            &store,
        );
        assert!(result.is_err());
        assert!(store.get(KEY_SERVER_URL).is_none());
    }

    #[test]
    fn test_unset_and_list() {
        let store = MemorySettingsStore::new()
            .with_entry(KEY_SERVER_URL, "ws://localhost:9000")
            .with_entry(KEY_VCP_KEY, "k");

        let out = run(SettingsAction::List, &store).unwrap();
        assert_eq!(out, "serverUrl    ws://localhost:9000\nvcpKey       k\n");

        let out = run(
            SettingsAction::Unset {
                key: KEY_VCP_KEY.to_string(),
            },
            &store,
        )
        .unwrap();
        assert_eq!(out, "Removed vcpKey\n");

        let out = run(
            SettingsAction::Unset {
                key: KEY_VCP_KEY.to_string(),
            },
            &store,
        )
        .unwrap();
        assert_eq!(out, "vcpKey was not set\n");
    }

    #[test]
    fn test_list_empty() {
        let store = MemorySettingsStore::new();
        assert_eq!(run(SettingsAction::List, &store).unwrap(), "No settings stored.\n");
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        {
            let store = FileSettingsStore::open(&path).unwrap();
            run(
                SettingsAction::Set {
                    key: KEY_SERVER_URL.to_string(),
                    value: "wss://vcp.example.com".to_string(),
                },
                &store,
            )
            .unwrap();
        }
        let store = FileSettingsStore::open(&path).unwrap();
        assert_eq!(store.get(KEY_SERVER_URL).as_deref(), Some("wss://vcp.example.com"));
    }
}
